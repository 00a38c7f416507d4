use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::path::Path;

use crate::models::record::EmotionLabel;
use crate::models::report::Track;

/// Label used when the catalogue has no list for the requested one.
pub const FALLBACK_LABEL: EmotionLabel = EmotionLabel::Okay;

/// Static label to track table served when no remote suggestion is wanted.
#[derive(Debug, Clone, Default)]
pub struct MusicCatalog {
    tracks: HashMap<EmotionLabel, Vec<Track>>,
}

impl MusicCatalog {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading music catalogue {}: {}", path.display(), e))?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            labels = catalog.tracks.len(),
            "Music catalogue loaded"
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let tracks: HashMap<EmotionLabel, Vec<Track>> = serde_json::from_str(raw)?;
        if !tracks.contains_key(&FALLBACK_LABEL) {
            anyhow::bail!("music catalogue has no \"{}\" list", FALLBACK_LABEL);
        }
        Ok(Self { tracks })
    }

    pub fn tracks_for(&self, label: EmotionLabel) -> &[Track] {
        self.tracks
            .get(&label)
            .or_else(|| self.tracks.get(&FALLBACK_LABEL))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Up to `n` distinct tracks for `label`, in random order.
    pub fn pick<R: Rng + ?Sized>(&self, label: EmotionLabel, n: usize, rng: &mut R) -> Vec<Track> {
        self.tracks_for(label)
            .choose_multiple(rng, n)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const BUNDLED: &str = include_str!("../../resources/music_catalog.json");

    #[test]
    fn bundled_catalogue_covers_every_label() {
        let catalog = MusicCatalog::from_json(BUNDLED).unwrap();
        for label in EmotionLabel::EMOTION_LABELS
            .iter()
            .chain(EmotionLabel::DIARY_LABELS.iter())
        {
            assert_eq!(catalog.tracks_for(*label).len(), 10, "{label}");
        }
    }

    #[test]
    fn pick_returns_distinct_tracks() {
        let catalog = MusicCatalog::from_json(BUNDLED).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = catalog.pick(EmotionLabel::Calm, 3, &mut rng);
        assert_eq!(picked.len(), 3);
        assert_ne!(picked[0], picked[1]);
        assert_ne!(picked[1], picked[2]);
        assert!(picked
            .iter()
            .all(|t| catalog.tracks_for(EmotionLabel::Calm).contains(t)));
    }

    #[test]
    fn missing_label_falls_back_to_okay() {
        let catalog = MusicCatalog::from_json(
            r#"{"okay":[{"title":"Let It Be","artist":"The Beatles","url":"https://example.com/a"}]}"#,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let picked = catalog.pick(EmotionLabel::Angry, 3, &mut rng);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].title, "Let It Be");
    }

    #[test]
    fn catalogue_without_fallback_is_rejected() {
        assert!(MusicCatalog::from_json(r#"{"great":[]}"#).is_err());
        assert!(MusicCatalog::from_json("not json").is_err());
    }
}

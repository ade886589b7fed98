//! The mode pack and effect catalog.
//!
//! The device addresses effects with a `(pack index, effect index)` pair. This
//! module maps those pairs to the names shown in the ExoyOne app and back.
//! Positions are part of the wire contract: the order below must match the
//! firmware and must never be reshuffled.

use crate::error::{ExoyOneError, Result};

/// A named group of effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePack {
    pub name: &'static str,
    pub effects: &'static [&'static str],
}

const MODE_PACKS: &[ModePack] = &[
    ModePack {
        name: "Rave",
        effects: &[
            "Beats Burst",
            "Laser Lash",
            "Electric Ave",
            "Hypnosis",
            "Glow Groove",
            "Whirling Spectrum",
            "Rainbow Rumble",
        ],
    },
    ModePack {
        name: "Party",
        effects: &[
            "Dance Floor",
            "Rhythm Run",
            "Pop Party",
            "Funky Flash",
            "Jubulo",
            "Gloze",
            "Color Rush",
            "Confetti",
            "Rising Rhythm",
            "Pulse Peaks",
            "Beat Orbit",
        ],
    },
    ModePack {
        name: "Chill",
        effects: &[
            "Soothing Sound",
            "Euphoria",
            "Dreamscape",
            "Serene Symphony",
            "Svelte",
            "Tranquilo",
        ],
    },
    ModePack {
        name: "Mood",
        effects: &[
            "Mood Swing",
            "Emotional Express",
            "Feeling Flow",
            "Zenith",
            "Nimbus",
        ],
    },
    ModePack {
        name: "Genre",
        effects: &[
            "Rockin' Rhythms",
            "Jazz Live",
            "Hip Hop Hues",
            "Country Crescendo",
            "EDM Flow",
            "Hardstyle Beats",
        ],
    },
    ModePack {
        name: "Themes",
        effects: &[
            "Cosmic Carnival",
            "Summer Breeze",
            "Desert Miracle",
            "Winter Wonderland",
            "Underwater Oasis",
            "Rainbow Ripple",
            "Error",
            "Matrix",
            "Beating Heart",
        ],
    },
    ModePack {
        name: "Nature",
        effects: &[
            "Wildfire",
            "Thunderstorm",
            "Aurora",
            "Rainbow Reflection",
            "Bloom",
            "Celestial",
            "Ebb & Flow",
            "Majestic",
            "Whirlwind",
            "Lightning",
            "Snowstorm",
        ],
    },
    ModePack {
        name: "Cosmic",
        effects: &[
            "Galaxy",
            "Cosmic Dust",
            "Solar Flare",
            "Sabre Fight",
            "Black Hole",
            "Meteor",
            "Astro",
            "Super Nova",
        ],
    },
    ModePack {
        name: "Background",
        effects: &[
            "Ambient Aura",
            "Twilight",
            "Dawn",
            "Custom Hue",
            "Color Carousel",
            "Shimmer",
            "Whisper",
        ],
    },
];

/// Read-only view over the built-in catalog.
///
/// Build one with [`ModePacks::new`] at start-up and hand it to whatever needs
/// name resolution. It is `Copy`, so passing it around costs a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePacks {
    packs: &'static [ModePack],
}

impl Default for ModePacks {
    fn default() -> Self {
        Self::new()
    }
}

impl ModePacks {
    pub fn new() -> Self {
        ModePacks { packs: MODE_PACKS }
    }

    pub fn packs(&self) -> &'static [ModePack] {
        self.packs
    }

    /// Pack names in index order.
    pub fn pack_names(&self) -> impl Iterator<Item = &'static str> {
        self.packs.iter().map(|pack| pack.name)
    }

    /// Every effect name, pack by pack, in index order.
    pub fn all_effects(&self) -> impl Iterator<Item = &'static str> {
        self.packs
            .iter()
            .flat_map(|pack| pack.effects.iter().copied())
    }

    /// Case-insensitive exact match against the pack names.
    pub fn pack_index_from_name(&self, name: &str) -> Option<usize> {
        self.packs
            .iter()
            .position(|pack| pack.name.eq_ignore_ascii_case(name))
    }

    pub fn pack_name(&self, pack_index: usize) -> Result<&'static str> {
        self.pack(pack_index).map(|pack| pack.name)
    }

    pub fn effects_for_pack(&self, pack_index: usize) -> Result<&'static [&'static str]> {
        self.pack(pack_index).map(|pack| pack.effects)
    }

    pub fn effect_name(&self, pack_index: usize, effect_index: usize) -> Result<&'static str> {
        let effects = self.effects_for_pack(pack_index)?;
        effects
            .get(effect_index)
            .copied()
            .ok_or(ExoyOneError::IndexOutOfRange {
                what: "effect",
                index: effect_index,
                len: effects.len(),
            })
    }

    /// Case-insensitive match of `effect_name` inside the named pack only.
    ///
    /// An unknown pack and an unknown effect both yield `None`.
    pub fn effect_index_from_name(&self, pack_name: &str, effect_name: &str) -> Option<usize> {
        let pack_index = self.pack_index_from_name(pack_name)?;
        self.packs[pack_index]
            .effects
            .iter()
            .position(|name| name.eq_ignore_ascii_case(effect_name))
    }

    /// Global, case-sensitive search for an effect across all packs.
    pub fn indices_from_effect_name(&self, effect_name: &str) -> Option<(usize, usize)> {
        self.packs.iter().enumerate().find_map(|(pack_index, pack)| {
            pack.effects
                .iter()
                .position(|name| *name == effect_name)
                .map(|effect_index| (pack_index, effect_index))
        })
    }

    /// Returns the catalog spelling of an effect given in any casing.
    pub fn canonical_effect_name(&self, effect_name: &str) -> Option<&'static str> {
        self.all_effects()
            .find(|name| name.eq_ignore_ascii_case(effect_name))
    }

    fn pack(&self, pack_index: usize) -> Result<&'static ModePack> {
        self.packs
            .get(pack_index)
            .ok_or(ExoyOneError::IndexOutOfRange {
                what: "pack",
                index: pack_index,
                len: self.packs.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_names_are_unique_ignoring_case() {
        let catalog = ModePacks::new();

        let packs: HashSet<String> = catalog.pack_names().map(str::to_lowercase).collect();
        assert_eq!(packs.len(), catalog.packs().len());

        let effects: HashSet<String> = catalog.all_effects().map(str::to_lowercase).collect();
        assert_eq!(effects.len(), catalog.all_effects().count());
    }

    #[test]
    fn test_effect_index_round_trip() {
        let catalog = ModePacks::new();
        for pack in catalog.packs() {
            let pack_index = catalog.pack_index_from_name(pack.name).unwrap();
            for effect in pack.effects {
                let effect_index = catalog.effect_index_from_name(pack.name, effect).unwrap();
                assert_eq!(
                    catalog.effects_for_pack(pack_index).unwrap()[effect_index],
                    *effect
                );
            }
        }
    }

    #[test]
    fn test_indices_from_effect_name_match_positions() {
        let catalog = ModePacks::new();
        for (pack_index, pack) in catalog.packs().iter().enumerate() {
            for (effect_index, effect) in pack.effects.iter().enumerate() {
                assert_eq!(
                    catalog.indices_from_effect_name(effect),
                    Some((pack_index, effect_index))
                );
                assert_eq!(
                    catalog.effect_name(pack_index, effect_index).unwrap(),
                    *effect
                );
            }
        }
    }

    #[rstest]
    #[case("mood", Some(3))]
    #[case("BACKGROUND", Some(8))]
    #[case("Rave", Some(0))]
    #[case("Invalid Pack", None)]
    #[case("", None)]
    fn test_pack_index_from_name(#[case] name: &str, #[case] expected: Option<usize>) {
        assert_eq!(ModePacks::new().pack_index_from_name(name), expected);
    }

    #[test]
    fn test_unknown_names_resolve_to_none() {
        let catalog = ModePacks::new();
        assert_eq!(catalog.effect_index_from_name("Mood", "Invalid Effect"), None);
        assert_eq!(catalog.effect_index_from_name("Invalid Pack", "Whisper"), None);
        assert_eq!(
            catalog.effect_index_from_name("Invalid Pack", "Invalid Effect"),
            None
        );
        assert_eq!(catalog.indices_from_effect_name("Invalid Effect"), None);
        assert_eq!(catalog.canonical_effect_name("Invalid Effect"), None);
    }

    #[test]
    fn test_effect_lookup_within_pack_ignores_case() {
        let catalog = ModePacks::new();
        assert_eq!(catalog.effect_index_from_name("nature", "ebb & flow"), Some(6));
        // Whisper exists, but not in the Rave pack.
        assert_eq!(catalog.effect_index_from_name("Rave", "Whisper"), None);
    }

    #[test]
    fn test_global_search_is_case_sensitive() {
        let catalog = ModePacks::new();
        assert_eq!(catalog.indices_from_effect_name("Whisper"), Some((8, 6)));
        assert_eq!(catalog.indices_from_effect_name("whisper"), None);
        assert_eq!(catalog.canonical_effect_name("whisper"), Some("Whisper"));
    }

    #[test]
    fn test_out_of_range_indices_fail() {
        let catalog = ModePacks::new();
        assert_matches!(
            catalog.effects_for_pack(9),
            Err(ExoyOneError::IndexOutOfRange {
                what: "pack",
                index: 9,
                len: 9
            })
        );
        assert_matches!(
            catalog.effect_name(3, 5),
            Err(ExoyOneError::IndexOutOfRange {
                what: "effect",
                index: 5,
                len: 5
            })
        );
    }
}

//! Velocity gate and table lookup for decoded keys.

use crate::action::{Position, WorldCommand, translate};
use crate::decoder::{Key, Velocity};
use crate::mapping::MappingTable;

pub const DEFAULT_VELOCITY_THRESHOLD: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub velocity_threshold: u8,
    pub secret_enabled: bool,
    pub debug_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            secret_enabled: false,
            debug_enabled: false,
        }
    }
}

/// Commands a decoded key produces: none, one, or one from each table.
///
/// The secret overlay is checked in addition to the primary table, not in
/// place of it.
pub fn dispatch(
    key: Key,
    velocity: Velocity,
    reference: Position,
    config: &EngineConfig,
    primary: &MappingTable,
    secret: &MappingTable,
) -> Vec<WorldCommand> {
    if velocity < config.velocity_threshold {
        return Vec::new();
    }

    let secret_hit = config
        .secret_enabled
        .then(|| secret.lookup(key))
        .flatten();

    secret_hit
        .into_iter()
        .chain(primary.lookup(key))
        .map(|entry| translate(reference, entry.offset, entry.action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Face, PositionOffset};
    use crate::mapping::MappingEntry;
    use proptest::prelude::*;

    fn table(entries: &[(i32, PositionOffset, Action)]) -> MappingTable {
        let mut table = MappingTable::default();
        for &(key, offset, action) in entries {
            table.insert(Key(key), MappingEntry { offset, action });
        }
        table
    }

    #[test]
    fn mapped_note_above_threshold_emits_one_command() {
        let primary = table(&[(60, PositionOffset::new(1, 0, -1), Action::East)]);
        let cmds = dispatch(
            Key(60),
            64,
            Position::new(100, 70, 100),
            &EngineConfig::default(),
            &primary,
            &MappingTable::default(),
        );
        assert_eq!(
            cmds,
            vec![WorldCommand::InteractAt {
                position: Position::new(101, 70, 99),
                face: Face::East
            }]
        );
    }

    #[test]
    fn unmapped_key_emits_nothing() {
        let primary = table(&[(60, PositionOffset::default(), Action::Strike)]);
        let cmds = dispatch(
            Key(61),
            127,
            Position::default(),
            &EngineConfig::default(),
            &primary,
            &MappingTable::default(),
        );
        assert!(cmds.is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let primary = table(&[(60, PositionOffset::default(), Action::Strike)]);
        let config = EngineConfig::default();
        let empty = MappingTable::default();
        let at = dispatch(Key(60), 20, Position::default(), &config, &primary, &empty);
        let below = dispatch(Key(60), 19, Position::default(), &config, &primary, &empty);
        assert_eq!(at.len(), 1);
        assert!(below.is_empty());
    }

    #[test]
    fn secret_fires_alongside_primary_when_enabled() {
        let primary = table(&[(60, PositionOffset::new(0, 0, 1), Action::Strike)]);
        let secret = table(&[(60, PositionOffset::new(0, 0, 2), Action::Up)]);
        let mut config = EngineConfig::default();

        let cmds = dispatch(Key(60), 100, Position::default(), &config, &primary, &secret);
        assert_eq!(cmds.len(), 1);

        config.secret_enabled = true;
        let cmds = dispatch(Key(60), 100, Position::default(), &config, &primary, &secret);
        assert_eq!(
            cmds,
            vec![
                WorldCommand::InteractAt {
                    position: Position::new(0, 0, 2),
                    face: Face::Up
                },
                WorldCommand::StrikeAt {
                    position: Position::new(0, 0, 1),
                    face: Face::Up
                },
            ]
        );
    }

    #[test]
    fn secret_only_key() {
        let secret = table(&[(10_001, PositionOffset::new(2, 0, 0), Action::South)]);
        let config = EngineConfig {
            secret_enabled: true,
            ..EngineConfig::default()
        };
        let cmds = dispatch(
            Key::SUSTAIN_ON,
            127,
            Position::default(),
            &config,
            &MappingTable::default(),
            &secret,
        );
        assert_eq!(cmds.len(), 1);
    }

    proptest! {
        #[test]
        fn below_threshold_never_emits(
            threshold in 1u8..=128,
            velocity in 0u8..128,
            key in 0i32..128,
        ) {
            prop_assume!(velocity < threshold);
            let primary = table(&[(key, PositionOffset::default(), Action::Strike)]);
            let secret = table(&[(key, PositionOffset::default(), Action::Up)]);
            let config = EngineConfig {
                velocity_threshold: threshold,
                secret_enabled: true,
                debug_enabled: false,
            };
            let origin = Position::default();
            let cmds = dispatch(Key(key), velocity, origin, &config, &primary, &secret);
            prop_assert!(cmds.is_empty());
        }

        #[test]
        fn target_is_reference_plus_offset(
            x in -1000i32..1000, y in -64i32..320, z in -1000i32..1000,
            dx in -16i32..16, dy in -16i32..16, dz in -16i32..16,
            velocity in 20u8..128,
        ) {
            let primary = table(&[(60, PositionOffset::new(dx, dy, dz), Action::Strike)]);
            let cmds = dispatch(
                Key(60), velocity, Position::new(x, y, z),
                &EngineConfig::default(), &primary, &MappingTable::default(),
            );
            prop_assert_eq!(cmds.len(), 1);
            prop_assert_eq!(cmds[0].position(), Position::new(x + dx, y + dy, z + dz));
        }
    }
}

use serde::Serialize;

/// One row of the missile-base technology catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MissileBaseSpec {
    /// Technology id that unlocks this base
    pub tech_id: u32,
    /// Tech level, used for miniaturization discounts
    pub level: u32,
    pub name: &'static str,
    /// BC cost before miniaturization
    pub base_cost: f32,
    /// Damage per missile hit
    pub damage: f32,
}

/// Missile-base technologies in research order.
pub const MISSILE_BASES: &[MissileBaseSpec] = &[
    MissileBaseSpec {
        tech_id: 100,
        level: 1,
        name: "Nuclear Missile",
        base_cost: 120.0,
        damage: 4.0,
    },
    MissileBaseSpec {
        tech_id: 101,
        level: 6,
        name: "Hyper-V Rocket",
        base_cost: 130.0,
        damage: 6.0,
    },
    MissileBaseSpec {
        tech_id: 102,
        level: 12,
        name: "Hyper-X Rocket",
        base_cost: 140.0,
        damage: 8.0,
    },
    MissileBaseSpec {
        tech_id: 103,
        level: 20,
        name: "Merculite Missile",
        base_cost: 150.0,
        damage: 10.0,
    },
    MissileBaseSpec {
        tech_id: 104,
        level: 30,
        name: "Stinger Missile",
        base_cost: 160.0,
        damage: 15.0,
    },
    MissileBaseSpec {
        tech_id: 105,
        level: 42,
        name: "Pulson Missile",
        base_cost: 170.0,
        damage: 20.0,
    },
];

/// Looks up a catalog entry by technology id.
pub fn by_tech(tech_id: u32) -> Option<&'static MissileBaseSpec> {
    MISSILE_BASES.iter().find(|m| m.tech_id == tech_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_in_research_order() {
        for pair in MISSILE_BASES.windows(2) {
            assert!(pair[0].level < pair[1].level);
            assert!(pair[0].damage < pair[1].damage);
        }
    }

    #[test]
    fn test_lookup_by_tech() {
        assert_eq!(by_tech(102).map(|m| m.name), Some("Hyper-X Rocket"));
        assert!(by_tech(7).is_none());
    }
}

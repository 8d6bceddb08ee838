//! Follow-up spending orders.
//!
//! An order is a minimum-spending request on one sub-goal ("prioritize
//! shields"). When a goal completes with intensity left over, the leftover
//! moves to the next unmet goal in [`FOLLOW_UP_CHAIN`].

use crate::category::CategoryKind;
use colony_data::defines::orders as defines;
use serde::{Deserialize, Serialize};

/// Sub-goals a settlement can be ordered to prioritize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    Shield,
    Bases,
    Factories,
    Soil,
    Atmosphere,
    Terraform,
    Population,
    None,
}

impl OrderKind {
    /// The spending category that carries out this order.
    pub fn category(self) -> Option<CategoryKind> {
        match self {
            OrderKind::Shield | OrderKind::Bases => Some(CategoryKind::Defense),
            OrderKind::Factories => Some(CategoryKind::Industry),
            OrderKind::Soil | OrderKind::Atmosphere | OrderKind::Terraform | OrderKind::Population => {
                Some(CategoryKind::Ecology)
            }
            OrderKind::None => None,
        }
    }

    /// Orders owned by a category.
    pub fn for_category(kind: CategoryKind) -> &'static [OrderKind] {
        match kind {
            CategoryKind::Defense => &[OrderKind::Shield, OrderKind::Bases],
            CategoryKind::Industry => &[OrderKind::Factories],
            CategoryKind::Ecology => &[
                OrderKind::Atmosphere,
                OrderKind::Soil,
                OrderKind::Terraform,
                OrderKind::Population,
            ],
            CategoryKind::Ship | CategoryKind::Research => &[],
        }
    }
}

/// One step of the follow-up chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowUp {
    pub order: OrderKind,
    /// Leftover intensity is divided by this before being re-issued
    pub divisor: f32,
}

/// Priority of follow-up goals once an ordered goal completes.
pub const FOLLOW_UP_CHAIN: [FollowUp; 5] = [
    FollowUp {
        order: OrderKind::Terraform,
        divisor: 1.0,
    },
    FollowUp {
        order: OrderKind::Factories,
        divisor: 1.0,
    },
    FollowUp {
        order: OrderKind::Population,
        divisor: 1.0,
    },
    FollowUp {
        order: OrderKind::Shield,
        divisor: 1.0,
    },
    FollowUp {
        order: OrderKind::Bases,
        divisor: defines::BASES_FOLLOW_UP_DIVISOR,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_order_belongs_to_its_category() {
        for kind in CategoryKind::ALL {
            for order in OrderKind::for_category(kind) {
                assert_eq!(order.category(), Some(kind));
            }
        }
        assert_eq!(OrderKind::None.category(), None);
    }

    #[test]
    fn test_chain_ends_with_weakened_bases() {
        let last = FOLLOW_UP_CHAIN[FOLLOW_UP_CHAIN.len() - 1];
        assert_eq!(last.order, OrderKind::Bases);
        assert_eq!(last.divisor, 5.0);
    }
}

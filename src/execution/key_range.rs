//! Folding key predicates into one inclusive interval.

use crate::common::{Error, Key, Result};

use super::condition::{Comparator, Condition};

/// Inclusive key interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub min: Key,
    pub max: Key,
}

impl KeyRange {
    /// Every key.
    pub const FULL: KeyRange = KeyRange {
        min: Key::MIN,
        max: Key::MAX,
    };

    /// Intersect all interval-shaped key predicates in `conditions`.
    ///
    /// `>` and `<` become `>=` and `<=` on the neighbouring key. Returns
    /// `Ok(None)` when no predicate bounds the key.
    ///
    /// # Errors
    /// `Error::InvalidKeyRange` when the predicates admit no key, including
    /// `key > i32::MAX` and `key < i32::MIN`.
    pub fn from_conditions(conditions: &[Condition]) -> Result<Option<KeyRange>> {
        // Widened so strict bounds at the i32 limits cannot wrap.
        let mut min = i64::from(Key::MIN);
        let mut max = i64::from(Key::MAX);
        let mut bounded = false;

        for condition in conditions {
            let Condition::Key(op, operand) = condition else {
                continue;
            };
            let operand = i64::from(*operand);
            match op {
                Comparator::Eq => {
                    min = min.max(operand);
                    max = max.min(operand);
                }
                Comparator::Gt => min = min.max(operand + 1),
                Comparator::Ge => min = min.max(operand),
                Comparator::Lt => max = max.min(operand - 1),
                Comparator::Le => max = max.min(operand),
                Comparator::Ne => continue,
            }
            bounded = true;
        }

        if max < min {
            return Err(Error::InvalidKeyRange {
                min: clamp(min),
                max: clamp(max),
            });
        }
        if !bounded {
            return Ok(None);
        }
        Ok(Some(KeyRange {
            min: clamp(min),
            max: clamp(max),
        }))
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::FULL
    }
}

fn clamp(bound: i64) -> Key {
    bound.clamp(i64::from(Key::MIN), i64::from(Key::MAX)) as Key
}

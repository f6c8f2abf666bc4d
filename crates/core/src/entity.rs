//! Records with a stable identity.

/// A stored record identified by its id rather than by its fields.
///
/// Purchases, movements and ledger entries are entities: two records with the
/// same id are the same record, even if one is a patched copy of the other.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    fn is(&self, id: &Self::Id) -> bool {
        self.id() == id
    }
}

/// Position of the record with `id` in an insertion-ordered list.
pub fn position_of<E: Entity>(records: &[E], id: &E::Id) -> Option<usize> {
    records.iter().position(|r| r.is(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    #[test]
    fn identity_ignores_other_fields() {
        let rows = [Row { id: 1, label: "a" }, Row { id: 2, label: "a" }];
        assert!(rows[0].is(&1));
        assert!(!rows[1].is(&1));
        assert_eq!(rows[0].label, rows[1].label);
    }

    #[test]
    fn position_follows_insertion_order() {
        let rows = [Row { id: 7, label: "x" }, Row { id: 3, label: "y" }];
        assert_eq!(position_of(&rows, &3), Some(1));
        assert_eq!(position_of(&rows, &9), None);
    }
}

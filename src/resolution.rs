use crate::expression::strip_table_prefix;

/// A column specifier as written: `col` or `table.col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// Splits on the first `.`; everything after it is the column.
    pub fn parse(specifier: &str) -> Self {
        match specifier.split_once('.') {
            Some((table, column)) => Self {
                table: Some(table.to_string()),
                column: column.to_string(),
            },
            None => Self {
                table: None,
                column: specifier.to_string(),
            },
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.table.is_some()
    }

    pub fn qualified_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.column),
            None => self.column.clone(),
        }
    }
}

/// One pass of column lookup over a list of candidate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// Candidate equals `table.col` exactly. Only applies to qualified refs.
    Qualified,
    /// Candidate equals the bare column name exactly.
    Unqualified,
    /// Candidate with any `table.` prefix removed equals the column name.
    Suffix,
}

impl ResolutionTier {
    fn matches(self, candidate: &str, target: &ColumnRef) -> bool {
        match self {
            ResolutionTier::Qualified => target.table.as_ref().map_or(false, |table| {
                candidate
                    .strip_prefix(table.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
                    == Some(target.column.as_str())
            }),
            ResolutionTier::Unqualified => candidate == target.column,
            ResolutionTier::Suffix => strip_table_prefix(candidate) == target.column,
        }
    }
}

/// Tiers for the left side of a join condition.
pub const JOIN_TIERS: [ResolutionTier; 3] = [
    ResolutionTier::Qualified,
    ResolutionTier::Unqualified,
    ResolutionTier::Suffix,
];

/// Tiers for a SELECT list entry: a qualified entry must match exactly, a
/// bare entry may match a qualified candidate by its suffix.
pub fn projection_tiers(target: &ColumnRef) -> &'static [ResolutionTier] {
    if target.is_qualified() {
        &[ResolutionTier::Qualified]
    } else {
        &[ResolutionTier::Unqualified, ResolutionTier::Suffix]
    }
}

/// Index of the column `target` names. Tiers are tried in order and the
/// first candidate, scanning left to right, that matches a tier wins.
pub fn resolve_column<S: AsRef<str>>(
    candidates: &[S],
    target: &ColumnRef,
    tiers: &[ResolutionTier],
) -> Option<usize> {
    tiers.iter().find_map(|tier| {
        candidates
            .iter()
            .position(|candidate| tier.matches(candidate.as_ref(), target))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOINED: [&str; 4] = ["student.ID", "student.Name", "enroll.ID", "enroll.Course"];

    #[test]
    fn test_column_ref_parse() {
        assert_eq!(
            ColumnRef::parse("student.ID"),
            ColumnRef {
                table: Some("student".into()),
                column: "ID".into()
            }
        );
        let bare = ColumnRef::parse("ID");
        assert!(!bare.is_qualified());
        assert_eq!(bare.qualified_name(), "ID");
        assert_eq!(ColumnRef::parse("a.b.c").column, "b.c");
    }

    #[test]
    fn test_qualified_match_wins() {
        let target = ColumnRef::parse("enroll.ID");
        assert_eq!(resolve_column(&JOINED, &target, &JOIN_TIERS), Some(2));
    }

    #[test]
    fn test_unqualified_before_suffix() {
        let names = ["student.ID", "ID"];
        let target = ColumnRef::parse("other.ID");
        assert_eq!(resolve_column(&names, &target, &JOIN_TIERS), Some(1));
    }

    #[test]
    fn test_suffix_takes_first_match() {
        let target = ColumnRef::parse("other.ID");
        assert_eq!(resolve_column(&JOINED, &target, &JOIN_TIERS), Some(0));
    }

    #[test]
    fn test_unresolved() {
        let target = ColumnRef::parse("student.GPA");
        assert_eq!(resolve_column(&JOINED, &target, &JOIN_TIERS), None);
        assert_eq!(resolve_column::<&str>(&[], &target, &JOIN_TIERS), None);
    }

    #[test]
    fn test_qualified_tier_needs_exact_table() {
        let target = ColumnRef::parse("stud.ID");
        assert_eq!(
            resolve_column(&JOINED, &target, &[ResolutionTier::Qualified]),
            None
        );
        let bare = ColumnRef::parse("ID");
        assert_eq!(
            resolve_column(&JOINED, &bare, &[ResolutionTier::Qualified]),
            None
        );
    }

    #[test]
    fn test_projection_tiers() {
        let bare = ColumnRef::parse("Course");
        assert_eq!(resolve_column(&JOINED, &bare, projection_tiers(&bare)), Some(3));

        let qualified = ColumnRef::parse("enroll.ID");
        assert_eq!(
            resolve_column(&JOINED, &qualified, projection_tiers(&qualified)),
            Some(2)
        );

        // a qualified entry never falls back to another table's column
        let wrong_table = ColumnRef::parse("course.ID");
        assert_eq!(
            resolve_column(&JOINED, &wrong_table, projection_tiers(&wrong_table)),
            None
        );

        // without joins names are bare
        let plain = ["ID", "Name"];
        assert_eq!(resolve_column(&plain, &bare, projection_tiers(&bare)), None);
        let name = ColumnRef::parse("Name");
        assert_eq!(resolve_column(&plain, &name, projection_tiers(&name)), Some(1));
    }
}

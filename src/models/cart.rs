use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub products: Vec<CartLine>,
    pub created_at: String,
    pub updated_at: String,
}

/// Merges lines sharing a product id by summing quantities.
///
/// First-seen order is kept and sums saturate at `u16::MAX`.
#[must_use]
pub fn collapse_lines(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());

    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }

    merged
}

/// Sets the quantity for `line.product_id`, appending when absent.
pub fn upsert_line(lines: &mut Vec<CartLine>, line: CartLine) {
    match lines.iter_mut().find(|l| l.product_id == line.product_id) {
        Some(existing) => existing.quantity = line.quantity,
        None => lines.push(line),
    }
}

/// Drops the line for `product_id`. Returns whether anything was removed.
pub fn remove_line(lines: &mut Vec<CartLine>, product_id: &str) -> bool {
    let before = lines.len();
    lines.retain(|l| l.product_id != product_id);
    lines.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: u16) -> CartLine {
        CartLine {
            product_id: id.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_collapse_sums_duplicates() {
        let merged = collapse_lines(vec![line("p1", 2), line("p2", 1), line("p1", 3)]);
        assert_eq!(merged, vec![line("p1", 5), line("p2", 1)]);
    }

    #[test]
    fn test_collapse_saturates() {
        let merged = collapse_lines(vec![line("p1", u16::MAX), line("p1", 10)]);
        assert_eq!(merged, vec![line("p1", u16::MAX)]);
    }

    #[test]
    fn test_upsert_replaces_quantity() {
        let mut lines = vec![line("p1", 2)];
        upsert_line(&mut lines, line("p1", 7));
        upsert_line(&mut lines, line("p2", 1));
        assert_eq!(lines, vec![line("p1", 7), line("p2", 1)]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut lines = vec![line("p1", 2)];
        assert!(!remove_line(&mut lines, "p9"));
        assert!(remove_line(&mut lines, "p1"));
        assert!(lines.is_empty());
    }
}

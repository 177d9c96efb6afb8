//! Filepath: src/infra/utils.rs
//! Small formatting helpers organized by focused structs.
//! All functions are associated fns to keep call sites
//! ergonomic and testable.

/// Number display helpers
pub struct NumberUtils;

impl NumberUtils
{
    /// Group digits by thousands with `,` (e.g. `440,000`)
    pub fn grouped(n: u64) -> String
    {
        // Render plain digits first
        let digits = n.to_string();

        // Room for one separator every three digits
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, ch) in digits
            .chars()
            .enumerate()
        {
            // Insert a separator whenever the remaining length is a multiple of 3
            if i > 0 && (digits.len() - i) % 3 == 0
            {
                out.push(',');
            }

            out.push(ch);
        }

        out
    }

    /// Grouped amount with the rouble sign
    pub fn roubles(n: u64) -> String
    {
        format!("₽{}", Self::grouped(n))
    }

    /// How far `total` is below `threshold`, zero when it is not
    pub fn shortfall(
        threshold: u64,
        total: u64,
    ) -> u64
    {
        threshold.saturating_sub(total)
    }
}

/// English plural helper for short labels
pub struct PluralUtils;

impl PluralUtils
{
    /// `1 item`, `3 items`
    pub fn count(
        n: usize,
        noun: &str,
    ) -> String
    {
        if n == 1 { format!("{n} {noun}") } else { format!("{n} {noun}s") }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn grouped_inserts_separators()
    {
        assert_eq!(NumberUtils::grouped(0), "0");
        assert_eq!(NumberUtils::grouped(999), "999");
        assert_eq!(NumberUtils::grouped(1_000), "1,000");
        assert_eq!(NumberUtils::grouped(440_000), "440,000");
        assert_eq!(NumberUtils::grouped(12_345_678), "12,345,678");
    }

    #[test]
    fn roubles_prefixes_sign()
    {
        assert_eq!(NumberUtils::roubles(50_000), "₽50,000");
    }

    #[test]
    fn shortfall_saturates()
    {
        assert_eq!(NumberUtils::shortfall(400_000, 120_000), 280_000);
        assert_eq!(NumberUtils::shortfall(400_000, 450_000), 0);
    }

    #[test]
    fn plural_counts()
    {
        assert_eq!(PluralUtils::count(1, "item"), "1 item");
        assert_eq!(PluralUtils::count(3, "item"), "3 items");
        assert_eq!(PluralUtils::count(0, "label"), "0 labels");
    }
}

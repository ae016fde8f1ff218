//! Header -> role resolution.
//!
//! Upstream sheets name their columns inconsistently ("Close", "BTC Close",
//! "close_usd"; "SPX", "SP500", "S&P 500"...). Roles are matched by
//! case-insensitive substring, using an ordered matcher table. For every role
//! the first header that matches wins; there is no ambiguity resolution.
//!
//! Resolution happens once per sheet, producing a typed [`ColumnMap`] before
//! any row is parsed.

use std::collections::BTreeMap;

use crate::domain::ColumnRole;

/// One entry of the matcher table.
#[derive(Debug, Clone, Copy)]
pub struct RoleMatcher {
    pub role: ColumnRole,
    /// Lowercase needles; a header matches if it contains any of them.
    pub needles: &'static [&'static str],
}

impl RoleMatcher {
    pub fn matches(&self, header: &str) -> bool {
        let header = header.to_lowercase();
        self.needles.iter().any(|needle| header.contains(needle))
    }
}

pub const ROLE_MATCHERS: &[RoleMatcher] = &[
    RoleMatcher { role: ColumnRole::Date, needles: &["date"] },
    RoleMatcher { role: ColumnRole::BalanceSheet, needles: &["fed bs", "walcl", "balance"] },
    RoleMatcher { role: ColumnRole::TreasuryAccount, needles: &["tga", "treasury", "wtregen"] },
    RoleMatcher { role: ColumnRole::RepoFacility, needles: &["rrp", "repo"] },
    RoleMatcher { role: ColumnRole::MoneySupply, needles: &["m2", "money supply"] },
    RoleMatcher { role: ColumnRole::NetLiquidity, needles: &["net liquidity", "net_liquidity"] },
    RoleMatcher { role: ColumnRole::Close, needles: &["close"] },
    RoleMatcher { role: ColumnRole::Nasdaq, needles: &["nasdaq", "ixic"] },
    RoleMatcher { role: ColumnRole::Spx, needles: &["spx", "sp500", "sp 500", "s&p"] },
    RoleMatcher { role: ColumnRole::SidelineCash, needles: &["amount", "sideline"] },
    RoleMatcher { role: ColumnRole::Sentiment, needles: &["vix", "index", "sentiment"] },
];

/// Resolved role -> column position for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: BTreeMap<ColumnRole, usize>,
}

impl ColumnMap {
    /// Resolve every known role against `headers`.
    pub fn resolve(headers: &[String]) -> Self {
        let positions = ROLE_MATCHERS
            .iter()
            .filter_map(|m| headers.iter().position(|h| m.matches(h)).map(|idx| (m.role, idx)))
            .collect();
        Self { positions }
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.positions.get(&role).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_matching_header_wins() {
        let map = ColumnMap::resolve(&headers(&["Date", "Adj Close", "Close"]));
        assert_eq!(map.get(ColumnRole::Date), Some(0));
        assert_eq!(map.get(ColumnRole::Close), Some(1));
    }

    #[test]
    fn index_aliases_resolve() {
        for name in ["SPX", "sp500", "SP 500 close", "S&P"] {
            let map = ColumnMap::resolve(&headers(&["Date", "NASDAQ Composite", name]));
            assert_eq!(map.get(ColumnRole::Nasdaq), Some(1));
            assert_eq!(map.get(ColumnRole::Spx), Some(2), "header {name}");
        }
    }

    #[test]
    fn liquidity_layout_resolves_every_role() {
        let map = ColumnMap::resolve(&headers(&["Date", "Fed BS", "TGA", "RRP", "M2", "Net Liquidity"]));
        assert_eq!(map.get(ColumnRole::BalanceSheet), Some(1));
        assert_eq!(map.get(ColumnRole::TreasuryAccount), Some(2));
        assert_eq!(map.get(ColumnRole::RepoFacility), Some(3));
        assert_eq!(map.get(ColumnRole::MoneySupply), Some(4));
        assert_eq!(map.get(ColumnRole::NetLiquidity), Some(5));
        assert_eq!(map.get(ColumnRole::Close), None);
    }

    #[test]
    fn missing_role_is_none() {
        let map = ColumnMap::resolve(&headers(&["Date", "Open", "High"]));
        assert_eq!(map.get(ColumnRole::Close), None);
        assert_eq!(map, ColumnMap::resolve(&headers(&["Date"])));
    }

    #[test]
    fn every_role_has_a_matcher() {
        for role in [
            ColumnRole::Date,
            ColumnRole::BalanceSheet,
            ColumnRole::TreasuryAccount,
            ColumnRole::RepoFacility,
            ColumnRole::MoneySupply,
            ColumnRole::NetLiquidity,
            ColumnRole::Close,
            ColumnRole::Nasdaq,
            ColumnRole::Spx,
            ColumnRole::SidelineCash,
            ColumnRole::Sentiment,
        ] {
            assert!(ROLE_MATCHERS.iter().any(|m| m.role == role), "{role}");
        }
    }
}

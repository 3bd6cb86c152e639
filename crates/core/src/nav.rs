//! URL addressing of the report's primary tab and selected table
//!
//! The address carries two query parameters: `tab` (primary tab slug, omitted on
//! the overview) and `table` (table slug, only on the two table-bearing tabs).
//! Unresolvable values fall back to the first tab or table.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use url::Url;

const TAB_PARAM: &str = "tab";
const TABLE_PARAM: &str = "table";

/// Top-level report section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryTab {
    Overview,
    Research,
    InitialAnalysis,
    AdvancedAnalysis,
    NextSteps,
}

impl PrimaryTab {
    pub const ALL: [PrimaryTab; 5] = [
        PrimaryTab::Overview,
        PrimaryTab::Research,
        PrimaryTab::InitialAnalysis,
        PrimaryTab::AdvancedAnalysis,
        PrimaryTab::NextSteps,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            PrimaryTab::Overview => "overview",
            PrimaryTab::Research => "research",
            PrimaryTab::InitialAnalysis => "initial-analysis",
            PrimaryTab::AdvancedAnalysis => "advanced-analysis",
            PrimaryTab::NextSteps => "next-steps",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrimaryTab::Overview => "Overview",
            PrimaryTab::Research => "Research Questions",
            PrimaryTab::InitialAnalysis => "Initial Analysis",
            PrimaryTab::AdvancedAnalysis => "Advanced Analysis",
            PrimaryTab::NextSteps => "Next Steps",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.slug() == slug)
    }

    /// Whether the tab shows a per-table selector
    pub fn has_tables(&self) -> bool {
        matches!(self, PrimaryTab::InitialAnalysis | PrimaryTab::AdvancedAnalysis)
    }
}

impl std::fmt::Display for PrimaryTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Ordered list of primary tabs actually shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLayout {
    tabs: Vec<PrimaryTab>,
}

impl TabLayout {
    /// All five tabs, or four when there are no advanced analyses
    pub fn new(has_advanced: bool) -> Self {
        let tabs = PrimaryTab::ALL
            .into_iter()
            .filter(|tab| has_advanced || *tab != PrimaryTab::AdvancedAnalysis)
            .collect();
        Self { tabs }
    }

    pub fn tabs(&self) -> &[PrimaryTab] {
        &self.tabs
    }

    pub fn get(&self, index: usize) -> Option<PrimaryTab> {
        self.tabs.get(index).copied()
    }

    pub fn index_of(&self, tab: PrimaryTab) -> Option<usize> {
        self.tabs.iter().position(|t| *t == tab)
    }

    fn index_of_slug(&self, slug: &str) -> Option<usize> {
        PrimaryTab::from_slug(slug).and_then(|tab| self.index_of(tab))
    }
}

/// Table names available on each table-bearing tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDirectory {
    initial: Vec<String>,
    advanced: Vec<String>,
}

impl TableDirectory {
    pub fn new(initial: Vec<String>, advanced: Vec<String>) -> Self {
        Self { initial, advanced }
    }

    pub fn initial(&self) -> &[String] {
        &self.initial
    }

    pub fn advanced(&self) -> &[String] {
        &self.advanced
    }

    pub fn layout(&self) -> TabLayout {
        TabLayout::new(!self.advanced.is_empty())
    }

    /// Tables shown on `tab`; empty for tabs without a table selector
    pub fn tables_for(&self, tab: PrimaryTab) -> &[String] {
        match tab {
            PrimaryTab::InitialAnalysis => &self.initial,
            PrimaryTab::AdvancedAnalysis => &self.advanced,
            _ => &[],
        }
    }
}

/// URL slug for a table name: lowercase, underscores become hyphens
pub fn table_slug(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

fn find_table(tables: &[String], slug: &str) -> usize {
    tables
        .iter()
        .position(|name| table_slug(name) == slug)
        .unwrap_or(0)
}

/// Current navigation selection, as indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    pub primary_tab: usize,
    pub initial_table: usize,
    pub advanced_table: usize,
}

impl NavState {
    /// Table index relevant to the current primary tab
    pub fn active_table(&self, layout: &TabLayout) -> usize {
        match layout.get(self.primary_tab) {
            Some(PrimaryTab::AdvancedAnalysis) => self.advanced_table,
            _ => self.initial_table,
        }
    }
}

/// Resolve a query string (with or without a leading `?`) into a state
pub fn decode(query: &str, tables: &TableDirectory) -> NavState {
    let query = query.strip_prefix('?').unwrap_or(query);
    let layout = tables.layout();

    let mut tab_slug = None;
    let mut table = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            TAB_PARAM if tab_slug.is_none() => tab_slug = Some(value.into_owned()),
            TABLE_PARAM if table.is_none() => table = Some(value.into_owned()),
            _ => {}
        }
    }

    let primary_tab = tab_slug
        .as_deref()
        .and_then(|slug| layout.index_of_slug(slug))
        .unwrap_or(0);

    let mut state = NavState {
        primary_tab,
        ..NavState::default()
    };

    if let Some(table) = table.as_deref().filter(|t| !t.is_empty()) {
        match layout.get(primary_tab) {
            Some(PrimaryTab::InitialAnalysis) => {
                state.initial_table = find_table(tables.initial(), table)
            }
            Some(PrimaryTab::AdvancedAnalysis) => {
                state.advanced_table = find_table(tables.advanced(), table)
            }
            _ => {}
        }
    }

    state
}

/// Build the query string (without `?`) addressing a tab and table.
///
/// Returns an empty string on the overview.
pub fn encode(primary_tab: usize, table_index: usize, tables: &TableDirectory) -> String {
    let tab = tables
        .layout()
        .get(primary_tab)
        .unwrap_or(PrimaryTab::Overview);

    let mut query = form_urlencoded::Serializer::new(String::new());
    if tab != PrimaryTab::Overview {
        query.append_pair(TAB_PARAM, tab.slug());
    }
    if let Some(name) = tables.tables_for(tab).get(table_index) {
        query.append_pair(TABLE_PARAM, &table_slug(name));
    }
    query.finish()
}

/// Where the current address lives (a browser location, a test double)
pub trait AddressBar {
    /// Current query string, possibly with a leading `?`
    fn query(&self) -> String;

    /// Replace the query in place, without adding a history entry
    fn replace_query(&mut self, query: &str);
}

/// In-memory address bar
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressBar {
    query: String,
    replacements: usize,
}

impl MemoryAddressBar {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            replacements: 0,
        }
    }

    /// Number of times the query was replaced
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl AddressBar for MemoryAddressBar {
    fn query(&self) -> String {
        self.query.clone()
    }

    fn replace_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.replacements += 1;
    }
}

/// Single owner of the navigation state.
///
/// The address is read once on `open`; after that every mutation publishes a
/// query derived from the in-memory state.
#[derive(Debug)]
pub struct Navigator<A: AddressBar> {
    address: A,
    tables: TableDirectory,
    state: NavState,
}

impl<A: AddressBar> Navigator<A> {
    pub fn open(address: A, tables: TableDirectory) -> Self {
        let state = decode(&address.query(), &tables);
        Self {
            address,
            tables,
            state,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn address(&self) -> &A {
        &self.address
    }

    pub fn current_tab(&self) -> PrimaryTab {
        self.tables
            .layout()
            .get(self.state.primary_tab)
            .unwrap_or(PrimaryTab::Overview)
    }

    pub fn set_primary_tab(&mut self, index: usize) {
        self.state.primary_tab = index;
        self.publish();
    }

    pub fn set_initial_table(&mut self, index: usize) {
        self.state.initial_table = index;
        self.publish();
    }

    pub fn set_advanced_table(&mut self, index: usize) {
        self.state.advanced_table = index;
        self.publish();
    }

    /// Query string for the current state
    pub fn query(&self) -> String {
        let layout = self.tables.layout();
        encode(
            self.state.primary_tab,
            self.state.active_table(&layout),
            &self.tables,
        )
    }

    fn publish(&mut self) {
        let query = self.query();
        self.address.replace_query(&query);
    }

    /// `base` with its query replaced by the current state and no fragment
    pub fn href(&self, base: &Url) -> Url {
        href(base, &self.query())
    }
}

/// `base` with its query replaced by `query` and no fragment
pub fn href(base: &Url, query: &str) -> Url {
    let mut url = base.clone();
    url.set_query(if query.is_empty() { None } else { Some(query) });
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn directory() -> TableDirectory {
        TableDirectory::new(
            names(&["fct_share_attempts", "dim_users"]),
            names(&["Cohort_Retention"]),
        )
    }

    #[test]
    fn test_layout_without_advanced() {
        let layout = TabLayout::new(false);
        let slugs: Vec<&str> = layout.tabs().iter().map(|t| t.slug()).collect();
        assert_eq!(slugs, vec!["overview", "research", "initial-analysis", "next-steps"]);
        assert_eq!(TabLayout::new(true).tabs().len(), 5);
    }

    #[test]
    fn test_table_slug() {
        assert_eq!(table_slug("FCT_Share_Attempts"), "fct-share-attempts");
        assert_eq!(table_slug("plain"), "plain");
    }

    #[test]
    fn test_decode_initial_table() {
        let state = decode("?tab=initial-analysis&table=dim-users", &directory());
        assert_eq!(
            state,
            NavState {
                primary_tab: 2,
                initial_table: 1,
                advanced_table: 0
            }
        );
    }

    #[test]
    fn test_decode_advanced_table() {
        let state = decode("tab=advanced-analysis&table=cohort-retention", &directory());
        assert_eq!(state.primary_tab, 3);
        assert_eq!(state.advanced_table, 0);
        assert_eq!(state.initial_table, 0);
    }

    #[test]
    fn test_decode_falls_back_to_defaults() {
        let dir = directory();
        assert_eq!(decode("", &dir), NavState::default());
        assert_eq!(decode("?tab=bogus&table=dim-users", &dir), NavState::default());
        assert_eq!(decode("tab=initial-analysis&table=nope", &dir).initial_table, 0);

        // advanced slug is not addressable without advanced tables
        let plain = TableDirectory::new(names(&["a"]), vec![]);
        assert_eq!(decode("tab=advanced-analysis", &plain).primary_tab, 0);
        assert_eq!(decode("tab=next-steps", &plain).primary_tab, 3);
    }

    #[test]
    fn test_table_param_ignored_on_other_tabs() {
        let state = decode("tab=research&table=dim-users", &directory());
        assert_eq!(state.primary_tab, 1);
        assert_eq!(state.initial_table, 0);
    }

    #[test]
    fn test_encode() {
        let dir = directory();
        assert_eq!(encode(0, 1, &dir), "");
        assert_eq!(encode(1, 1, &dir), "tab=research");
        assert_eq!(encode(2, 1, &dir), "tab=initial-analysis&table=dim-users");
        assert_eq!(encode(3, 0, &dir), "tab=advanced-analysis&table=cohort-retention");
        assert_eq!(encode(4, 0, &dir), "tab=next-steps");
        assert_eq!(encode(9, 0, &dir), "");
        assert_eq!(encode(2, 7, &dir), "tab=initial-analysis");
    }

    #[test]
    fn test_encode_percent_encodes_table_names() {
        let dir = TableDirectory::new(names(&["sales & returns"]), vec![]);
        let query = encode(2, 0, &dir);
        assert_eq!(query, "tab=initial-analysis&table=sales+%26+returns");
        assert_eq!(decode(&query, &dir).initial_table, 0);
    }

    #[test]
    fn test_round_trip_every_tab_and_table() {
        let dir = directory();
        let layout = dir.layout();
        for (primary, tab) in layout.tabs().iter().enumerate() {
            let tables = dir.tables_for(*tab);
            let count = tables.len().max(1);
            for table in 0..count {
                let state = decode(&encode(primary, table, &dir), &dir);
                assert_eq!(state.primary_tab, primary);
                match tab {
                    PrimaryTab::InitialAnalysis => assert_eq!(state.initial_table, table),
                    PrimaryTab::AdvancedAnalysis => assert_eq!(state.advanced_table, table),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_navigator_reads_once_and_publishes() {
        let bar = MemoryAddressBar::new("?tab=initial-analysis&table=dim-users");
        let mut nav = Navigator::open(bar, directory());
        assert_eq!(nav.state().initial_table, 1);
        assert_eq!(nav.address().replacements(), 0);

        nav.set_primary_tab(3);
        assert_eq!(nav.address().query(), "tab=advanced-analysis&table=cohort-retention");

        nav.set_primary_tab(2);
        assert_eq!(nav.address().query(), "tab=initial-analysis&table=dim-users");

        nav.set_initial_table(0);
        assert_eq!(nav.address().query(), "tab=initial-analysis&table=fct-share-attempts");

        nav.set_primary_tab(0);
        assert_eq!(nav.address().query(), "");
        assert_eq!(nav.address().replacements(), 4);
        assert_eq!(nav.current_tab(), PrimaryTab::Overview);
    }

    #[test]
    fn test_selecting_inactive_table_publishes_active_tab() {
        let mut nav = Navigator::open(MemoryAddressBar::default(), directory());
        nav.set_primary_tab(3);
        nav.set_initial_table(1);

        assert_eq!(nav.address().query(), "tab=advanced-analysis&table=cohort-retention");
        assert_eq!(nav.state().initial_table, 1);
    }

    #[test]
    fn test_href_replaces_query_and_drops_fragment() {
        let mut nav = Navigator::open(MemoryAddressBar::default(), directory());
        let base = Url::parse("https://reports.example.com/q1/index.html?old=1#charts").unwrap();

        assert_eq!(
            nav.href(&base).as_str(),
            "https://reports.example.com/q1/index.html"
        );

        nav.set_primary_tab(1);
        assert_eq!(
            nav.href(&base).as_str(),
            "https://reports.example.com/q1/index.html?tab=research"
        );
    }

    #[test]
    fn test_primary_tab_slugs() {
        for tab in PrimaryTab::ALL {
            assert_eq!(PrimaryTab::from_slug(tab.slug()), Some(tab));
        }
        assert_eq!(PrimaryTab::from_slug("Overview"), None);
        assert!(PrimaryTab::AdvancedAnalysis.has_tables());
        assert!(!PrimaryTab::NextSteps.has_tables());
    }
}

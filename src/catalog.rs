//! Portfolio collections and their GraphQL queries

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Funds,
    Conferences,
    Publications,
    Books,
}

const PARTNERS_FIELD: &str = "partners";

impl Collection {
    pub const ALL: [Collection; 5] = [
        Self::Projects,
        Self::Funds,
        Self::Conferences,
        Self::Publications,
        Self::Books,
    ];

    /// The GraphQL root field, which is also the collection key in each page.
    pub fn root_field(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Funds => "funds",
            Self::Conferences => "conferences",
            Self::Publications => "publications",
            Self::Books => "books",
        }
    }

    fn filters_input(&self) -> &'static str {
        match self {
            Self::Projects => "ProjectFiltersInput",
            Self::Funds => "FundFiltersInput",
            Self::Conferences => "ConferenceFiltersInput",
            Self::Publications => "PublicationFiltersInput",
            Self::Books => "BookFiltersInput",
        }
    }

    /// Scalar fields selected for each record.
    fn selection(&self) -> &'static str {
        match self {
            Self::Projects => "title status startDate endDate budget",
            Self::Funds => "title funder amount status startDate endDate",
            Self::Conferences => "title venue country startDate endDate",
            Self::Publications => "title journal year doi",
            Self::Books => "title publisher isbn year",
        }
    }

    /// One-hop relations whose partners also decide visibility.
    fn related(&self) -> &'static [&'static str] {
        match self {
            Self::Projects => &["funds"],
            Self::Publications => &["funds", "projects"],
            Self::Funds | Self::Conferences | Self::Books => &[],
        }
    }

    /// The paged GraphQL query for this collection.
    ///
    /// Takes `$pagination`, `$sort` and `$filters`, and selects the partner
    /// data the access filter needs.
    pub fn query(&self) -> String {
        let field = self.root_field();
        let related: String = self
            .related()
            .iter()
            .map(|r| format!(" {} {{ documentId {} }}", r, PARTNERS_FIELD))
            .collect();
        format!(
            "query {name}($pagination: PaginationArg, $sort: [String], $filters: {filters}) {{ \
             {field}(pagination: $pagination, sort: $sort, filters: $filters) {{ \
             documentId {selection} {partners}{related} }} }}",
            name = capitalize(field),
            filters = self.filters_input(),
            field = field,
            selection = self.selection(),
            partners = PARTNERS_FIELD,
            related = related,
        )
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| {
                let plural = c.root_field();
                name == plural || Some(name.as_str()) == plural.strip_suffix('s')
            })
            .ok_or_else(|| format!("unknown collection: {}", s.trim()))
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.root_field())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

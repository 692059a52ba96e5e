#[cfg(test)]
use std::cmp::Ordering;

use serde::Deserialize;
use thiserror::Error;
use utoipa::IntoParams;

#[cfg(test)]
use super::models::Event;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 100;

const SELECT_EVENTS: &str = "SELECT e.id, e.title, e.venue_id, e.date, e.description, e.presenter, \
     v.name AS venue_name FROM events e LEFT JOIN venues v ON v.id = e.venue_id";
const COUNT_EVENTS: &str = "SELECT COUNT(*) FROM events e";

/// SQL query builder for the event listing
/// Produces a page query and a matching count query sharing the same filters
pub struct SQLQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: Option<String>,
    limit: u32,
    offset: u32,
}

impl Default for SQLQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SQLQueryBuilder {
    pub fn new() -> Self {
        Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Builds a builder with every filter, the sort and the page of `query`
    pub fn from_query(query: &EventQuery) -> Self {
        let mut builder = Self::new();
        if let Some(venue_id) = &query.venue_id {
            builder.add_venue_filter(venue_id);
        }
        if let Some(title) = &query.title {
            builder.add_substring_filter("e.title", title);
        }
        if let Some(presenter) = &query.presenter {
            builder.add_substring_filter("e.presenter", presenter);
        }
        builder.add_date_range(query.date_from.as_deref(), query.date_to.as_deref());
        builder.set_sort(query.sort_field, query.sort_order);
        builder.set_pagination(query.limit, query.offset);
        builder
    }

    fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }

    pub fn add_venue_filter(&mut self, venue_id: &str) {
        let index = self.next_placeholder();
        self.where_clauses.push(format!("e.venue_id = ${}", index));
        self.params.push(venue_id.to_string());
    }

    /// Case-insensitive substring match; LIKE wildcards in `needle` match literally
    pub fn add_substring_filter(&mut self, column: &str, needle: &str) {
        let index = self.next_placeholder();
        self.where_clauses.push(format!("{} ILIKE ${}", column, index));
        self.params.push(format!("%{}%", escape_like(needle)));
    }

    /// Both bounds are inclusive and compared as text
    pub fn add_date_range(&mut self, from: Option<&str>, to: Option<&str>) {
        if let Some(from) = from {
            let index = self.next_placeholder();
            self.where_clauses.push(format!("e.date >= ${}", index));
            self.params.push(from.to_string());
        }

        if let Some(to) = to {
            let index = self.next_placeholder();
            self.where_clauses.push(format!("e.date <= ${}", index));
            self.params.push(to.to_string());
        }
    }

    /// Orders by `field`, then by id so pages are stable
    pub fn set_sort(&mut self, field: EventSortField, order: SortOrder) {
        let order_str = order.as_sql();
        let clause = match field {
            EventSortField::Id => format!("e.id COLLATE \"C\" {}", order_str),
            other => format!(
                "{} COLLATE \"C\" {}, e.id COLLATE \"C\" ASC",
                other.column(),
                order_str
            ),
        };
        self.order_clause = Some(clause);
    }

    pub fn set_pagination(&mut self, limit: u32, offset: u32) {
        self.limit = limit;
        self.offset = offset;
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Returns (page query, count query, bound parameters)
    ///
    /// Both queries take the same parameters in the same order. LIMIT and
    /// OFFSET are validated integers and are inlined.
    pub fn build(&self) -> (String, String, Vec<String>) {
        let where_sql = self.where_sql();

        let mut query = format!("{}{}", SELECT_EVENTS, where_sql);
        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        let count = format!("{}{}", COUNT_EVENTS, where_sql);

        (query, count, self.params.clone())
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Query string of GET /api/events and GET /api/admin/events
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventQueryParams {
    /// Restrict to one venue
    #[serde(rename = "venueid")]
    pub venue_id: Option<String>,
    /// Case-insensitive substring of the title
    pub q: Option<String>,
    /// Case-insensitive substring of the presenter
    pub presenter: Option<String>,
    /// Page size, 1 to 100 (default 50)
    pub limit: Option<i64>,
    /// Items to skip (default 0)
    pub offset: Option<i64>,
    /// `date`, `title` or `id` (default `date`)
    pub sort: Option<String>,
    /// `asc` or `desc` (default `asc`)
    pub order: Option<String>,
    /// Inclusive lower bound on the date text
    pub date_from: Option<String>,
    /// Inclusive upper bound on the date text
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSortField {
    #[default]
    Date,
    Title,
    Id,
}

impl EventSortField {
    fn column(self) -> &'static str {
        match self {
            EventSortField::Date => "e.date",
            EventSortField::Title => "e.title",
            EventSortField::Id => "e.id",
        }
    }

    #[cfg(test)]
    fn key(self, event: &Event) -> &str {
        match self {
            EventSortField::Date => &event.date,
            EventSortField::Title => &event.title,
            EventSortField::Id => &event.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated and normalized listing query
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub venue_id: Option<String>,
    /// Title substring
    pub title: Option<String>,
    pub presenter: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_field: EventSortField,
    pub sort_order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            venue_id: None,
            title: None,
            presenter: None,
            date_from: None,
            date_to: None,
            sort_field: EventSortField::default(),
            sort_order: SortOrder::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// In-memory evaluation of the listing, mirroring the generated SQL
#[cfg(test)]
impl EventQuery {
    /// Whether `event` passes every filter
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(venue_id) = &self.venue_id {
            if &event.venue_id != venue_id {
                return false;
            }
        }
        if let Some(title) = &self.title {
            if !contains_ignore_case(&event.title, title) {
                return false;
            }
        }
        if let Some(presenter) = &self.presenter {
            if !contains_ignore_case(&event.presenter, presenter) {
                return false;
            }
        }
        if let Some(from) = &self.date_from {
            if event.date.as_str() < from.as_str() {
                return false;
            }
        }
        if let Some(to) = &self.date_to {
            if event.date.as_str() > to.as_str() {
                return false;
            }
        }
        true
    }

    /// Ordering used by the listing, with id as the tiebreak
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let primary = self.sort_field.key(a).cmp(self.sort_field.key(b));
        let primary = match self.sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Error, PartialEq)]
#[error("{message}")]
pub struct InvalidQuery {
    pub message: String,
}

impl InvalidQuery {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    pub fn validate(params: EventQueryParams) -> Result<EventQuery, InvalidQuery> {
        let limit = match params.limit {
            Some(limit) if (1..=MAX_LIMIT as i64).contains(&limit) => limit as u32,
            Some(_) => {
                return Err(InvalidQuery::new(format!(
                    "limit must be between 1 and {}",
                    MAX_LIMIT
                )))
            }
            None => DEFAULT_LIMIT,
        };

        let offset = match params.offset {
            Some(offset) if offset < 0 => {
                return Err(InvalidQuery::new("offset must be zero or greater"))
            }
            Some(offset) => u32::try_from(offset)
                .map_err(|_| InvalidQuery::new("offset is too large"))?,
            None => 0,
        };

        let sort_field = match Self::normalize_string(params.sort) {
            Some(sort) => Self::parse_sort_field(&sort)?,
            None => EventSortField::default(),
        };

        let sort_order = match Self::normalize_string(params.order) {
            Some(order) => Self::parse_sort_order(&order)?,
            None => SortOrder::default(),
        };

        Ok(EventQuery {
            venue_id: Self::normalize_string(params.venue_id),
            title: Self::normalize_string(params.q),
            presenter: Self::normalize_string(params.presenter),
            date_from: Self::normalize_string(params.date_from),
            date_to: Self::normalize_string(params.date_to),
            sort_field,
            sort_order,
            limit,
            offset,
        })
    }

    /// Trims; empty and whitespace-only values count as absent
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    fn parse_sort_field(s: &str) -> Result<EventSortField, InvalidQuery> {
        match s.to_lowercase().as_str() {
            "date" => Ok(EventSortField::Date),
            "title" => Ok(EventSortField::Title),
            "id" | "eventid" => Ok(EventSortField::Id),
            _ => Err(InvalidQuery::new(format!(
                "Invalid sort field '{}'. Must be 'date', 'title' or 'id'",
                s
            ))),
        }
    }

    fn parse_sort_order(s: &str) -> Result<SortOrder, InvalidQuery> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(InvalidQuery::new(format!(
                "Invalid sort order '{}'. Must be 'asc' or 'desc'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn event(id: &str, title: &str, date: &str) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            venue_id: "v1".to_string(),
            date: date.to_string(),
            description: String::new(),
            presenter: "Leisure and Cultural Services Department".to_string(),
        }
    }

    #[test]
    fn test_sql_builder_basic_query() {
        let (query, count, params) = SQLQueryBuilder::new().build();

        assert!(query.starts_with(SELECT_EVENTS));
        assert!(query.contains("LIMIT 50"));
        assert!(query.contains("OFFSET 0"));
        assert!(!query.contains("WHERE"));
        assert_eq!(count, COUNT_EVENTS);
        assert!(params.is_empty());
    }

    #[test]
    fn test_sql_builder_with_title_filter() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_substring_filter("e.title", "opera");
        let (query, count, params) = builder.build();

        assert!(query.contains("WHERE e.title ILIKE $1"));
        assert!(count.contains("WHERE e.title ILIKE $1"));
        assert_eq!(params[0], "%opera%");
    }

    #[test]
    fn test_sql_builder_escapes_like_wildcards() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_substring_filter("e.title", "100%_fun\\");
        let (_, _, params) = builder.build();

        assert_eq!(params[0], "%100\\%\\_fun\\\\%");
    }

    #[test]
    fn test_sql_builder_with_date_range() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_date_range(Some("2025-11-01"), Some("2025-11-30"));
        let (query, _, params) = builder.build();

        assert!(query.contains("e.date >= $1"));
        assert!(query.contains("e.date <= $2"));
        assert_eq!(params, vec!["2025-11-01", "2025-11-30"]);
    }

    #[test]
    fn test_sql_builder_with_sorting() {
        let mut builder = SQLQueryBuilder::new();
        builder.set_sort(EventSortField::Title, SortOrder::Desc);
        let (query, _, _) = builder.build();
        assert!(query.contains("ORDER BY e.title COLLATE \"C\" DESC, e.id COLLATE \"C\" ASC"));

        builder.set_sort(EventSortField::Id, SortOrder::Asc);
        let (query, _, _) = builder.build();
        assert!(query.contains("ORDER BY e.id COLLATE \"C\" ASC LIMIT"));
    }

    #[test]
    fn test_sql_builder_combined_filters() {
        let query = EventQuery {
            venue_id: Some("v1".to_string()),
            title: Some("jazz".to_string()),
            presenter: Some("lcsd".to_string()),
            date_from: Some("2025".to_string()),
            date_to: None,
            sort_field: EventSortField::Date,
            sort_order: SortOrder::Asc,
            limit: 5,
            offset: 10,
        };
        let (sql, count, params) = SQLQueryBuilder::from_query(&query).build();

        assert!(sql.contains("e.venue_id = $1"));
        assert!(sql.contains("e.title ILIKE $2"));
        assert!(sql.contains("e.presenter ILIKE $3"));
        assert!(sql.contains("e.date >= $4"));
        assert!(sql.contains("LIMIT 5"));
        assert!(sql.contains("OFFSET 10"));
        assert!(!count.contains("LIMIT"));
        assert!(!count.contains("ORDER BY"));
        assert_eq!(params, vec!["v1", "%jazz%", "%lcsd%", "2025"]);
    }

    #[test]
    fn test_validate_defaults() {
        let validated = QueryValidator::validate(EventQueryParams::default()).unwrap();
        assert_eq!(validated, EventQuery::default());
        assert_eq!(validated.limit, 50);
        assert_eq!(validated.offset, 0);
        assert_eq!(validated.sort_field, EventSortField::Date);
        assert_eq!(validated.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_validate_limit_bounds() {
        for limit in [0, -1, 101] {
            let params = EventQueryParams {
                limit: Some(limit),
                ..Default::default()
            };
            assert!(QueryValidator::validate(params).is_err(), "limit {}", limit);
        }

        let params = EventQueryParams {
            limit: Some(100),
            ..Default::default()
        };
        assert_eq!(QueryValidator::validate(params).unwrap().limit, 100);
    }

    #[test]
    fn test_validate_negative_offset() {
        let params = EventQueryParams {
            offset: Some(-5),
            ..Default::default()
        };
        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_parse_sort_field_aliases() {
        assert_eq!(QueryValidator::parse_sort_field("TITLE").unwrap(), EventSortField::Title);
        assert_eq!(QueryValidator::parse_sort_field("id").unwrap(), EventSortField::Id);
        assert_eq!(QueryValidator::parse_sort_field("eventId").unwrap(), EventSortField::Id);
        assert!(QueryValidator::parse_sort_field("price").is_err());
    }

    #[test]
    fn test_parse_sort_order() {
        assert_eq!(QueryValidator::parse_sort_order("DESC").unwrap(), SortOrder::Desc);
        assert!(QueryValidator::parse_sort_order("sideways").is_err());
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let params = EventQueryParams {
            q: Some("   ".to_string()),
            venue_id: Some("".to_string()),
            ..Default::default()
        };
        let validated = QueryValidator::validate(params).unwrap();
        assert_eq!(validated.title, None);
        assert_eq!(validated.venue_id, None);
    }

    #[test]
    fn test_matches_filters() {
        let e = event("1", "Jazz Night", "2025-11-14");
        let mut query = EventQuery {
            title: Some("JAZZ".to_string()),
            presenter: Some("cultural".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&e));

        query.date_from = Some("2025-11-15".to_string());
        assert!(!query.matches(&e));

        query.date_from = Some("2025-11-14".to_string());
        query.date_to = Some("2025-11-14".to_string());
        assert!(query.matches(&e));

        query.venue_id = Some("v2".to_string());
        assert!(!query.matches(&e));
    }

    #[test]
    fn test_compare_breaks_ties_by_id() {
        let query = EventQuery {
            sort_field: EventSortField::Title,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        let a = event("a", "Same", "x");
        let b = event("b", "Same", "x");
        assert_eq!(query.compare(&a, &b), Ordering::Less);
    }

    proptest! {
        #[test]
        fn prop_valid_limits_accepted(limit in 1i64..=100, offset in 0i64..10_000) {
            let params = EventQueryParams {
                limit: Some(limit),
                offset: Some(offset),
                ..Default::default()
            };
            let validated = QueryValidator::validate(params).unwrap();
            prop_assert_eq!(validated.limit as i64, limit);
            prop_assert_eq!(validated.offset as i64, offset);
        }

        #[test]
        fn prop_escaped_pattern_has_no_bare_wildcards(needle in "[a-z%_\\\\]{0,12}") {
            let escaped = escape_like(&needle);
            let mut chars = escaped.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    prop_assert!(matches!(chars.next(), Some('\\' | '%' | '_')));
                } else {
                    prop_assert!(c != '%' && c != '_');
                }
            }
        }
    }
}

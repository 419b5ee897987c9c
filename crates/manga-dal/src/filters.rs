use std::fmt::Display;

use manga_types::{validator::permitted_value, Validator};
use serde::Serialize;

use crate::{Error, error::Result};

pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

const DESCENDING_MARKER: char = '-';

/// Resolved sort column. Column names only ever come from a static allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc(&'static str),
    Desc(&'static str),
}

impl Order {
    pub fn column(&self) -> &'static str {
        match *self {
            Order::Asc(c) | Order::Desc(c) => c,
        }
    }

    pub fn direction(&self) -> &'static str {
        match self {
            Order::Asc(_) => "ASC",
            Order::Desc(_) => "DESC",
        }
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.column(), self.direction())
    }
}

/// Client supplied paging and sorting, not trusted until [`Filters::validate`] passes.
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    pub fn new(
        page: i64,
        page_size: i64,
        sort: impl Into<String>,
        sort_safelist: &'static [&'static str],
    ) -> Self {
        Self {
            page,
            page_size,
            sort: sort.into(),
            sort_safelist,
        }
    }

    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(self.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(
            self.page_size <= MAX_PAGE_SIZE,
            "page_size",
            "must be a maximum of 100",
        );
        v.check(
            permitted_value(&self.sort.as_str(), self.sort_safelist),
            "sort",
            "invalid sort value",
        );
    }

    pub fn order(&self) -> Result<Order> {
        self.sort_safelist
            .iter()
            .find(|&&permitted| permitted == self.sort)
            .map(|&permitted| match permitted.strip_prefix(DESCENDING_MARKER) {
                Some(column) => Order::Desc(column),
                None => Order::Asc(permitted),
            })
            .ok_or_else(|| Error::InvalidOrderByField(self.sort.clone()))
    }

    /// `ORDER BY` body, with id as tie-break so pages stay stable.
    pub fn ordering(&self) -> Result<String> {
        let order = self.order()?;
        if order.column() == "id" {
            Ok(order.to_string())
        } else {
            Ok(format!("{order}, id ASC"))
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0) * self.page_size
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 {
            return Metadata::default();
        }
        let page_size_div = page_size.max(1);
        Metadata {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size_div - 1) / page_size_div,
            total_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    const SAFELIST: &[&str] = &["id", "title", "-id", "-title"];

    fn validated(filters: &Filters) -> Validator {
        let mut v = Validator::new();
        filters.validate(&mut v);
        v
    }

    #[quickcheck]
    fn test_limit_and_offset(page: u32, page_size: u8) -> bool {
        let page = i64::from(page) % MAX_PAGE + 1;
        let page_size = i64::from(page_size) % MAX_PAGE_SIZE + 1;
        let filters = Filters::new(page, page_size, "title", SAFELIST);

        validated(&filters).valid()
            && filters.limit() == page_size
            && filters.offset() == (page - 1) * page_size
    }

    #[test]
    fn test_bounds() {
        let v = validated(&Filters::new(0, 0, "id", SAFELIST));
        assert_eq!("must be greater than zero", v.errors()["page"]);
        assert_eq!("must be greater than zero", v.errors()["page_size"]);
        assert!(!v.errors().contains_key("sort"));

        let v = validated(&Filters::new(MAX_PAGE + 1, 101, "id", SAFELIST));
        assert_eq!("must be a maximum of 10 million", v.errors()["page"]);
        assert_eq!("must be a maximum of 100", v.errors()["page_size"]);

        assert!(validated(&Filters::new(MAX_PAGE, 100, "-title", SAFELIST)).valid());
    }

    #[test]
    fn test_sort_not_in_safelist() {
        for sort in ["year", "ID", "title; DROP TABLE manga", "--id", ""] {
            let filters = Filters::new(1, 20, sort, SAFELIST);
            let v = validated(&filters);
            assert_eq!(Some(&"invalid sort value".to_string()), v.errors().get("sort"));
            assert!(matches!(filters.order(), Err(Error::InvalidOrderByField(_))));
        }
    }

    #[test]
    fn test_order_resolution() {
        let filters = Filters::new(1, 20, "-title", SAFELIST);
        assert_eq!(Order::Desc("title"), filters.order().unwrap());
        assert_eq!("title DESC, id ASC", filters.ordering().unwrap());

        let filters = Filters::new(1, 20, "id", SAFELIST);
        assert_eq!(Order::Asc("id"), filters.order().unwrap());
        assert_eq!("id ASC", filters.ordering().unwrap());
    }

    #[test]
    fn test_metadata() {
        assert_eq!(Metadata::default(), Metadata::calculate(0, 3, 20));

        let m = Metadata::calculate(95, 2, 20);
        assert_eq!(5, m.last_page);
        assert_eq!(1, m.first_page);
        assert_eq!(2, m.current_page);
        assert_eq!(20, m.page_size);
        assert_eq!(95, m.total_records);

        assert_eq!(1, Metadata::calculate(20, 1, 20).last_page);
        assert_eq!(2, Metadata::calculate(21, 1, 20).last_page);
    }
}

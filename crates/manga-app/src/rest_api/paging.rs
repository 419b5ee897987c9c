use manga_dal::Filters;
use manga_types::Validator;
use serde::Deserialize;

/// Raw listing query string. Values stay text so that malformed numbers can be
/// reported per field instead of failing the whole extraction.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListQuery {
    /// Words that must all appear in the title
    pub title: Option<String>,
    /// Comma separated genres, a record must have all of them
    pub genres: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    /// One of `id`, `title`, `year`, `runtime`, prefixed with `-` for descending order
    pub sort: Option<String>,
}

impl ListQuery {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("").trim()
    }

    pub fn genres(&self) -> Vec<String> {
        read_csv(self.genres.as_deref())
    }

    pub fn filters(
        &self,
        default_page_size: i64,
        sort_safelist: &'static [&'static str],
        default_sort: &str,
        v: &mut Validator,
    ) -> Filters {
        let page = read_int(self.page.as_deref(), 1, "page", v);
        let page_size = read_int(self.page_size.as_deref(), default_page_size, "page_size", v);
        let sort = match self.sort.as_deref() {
            None | Some("") => default_sort,
            Some(sort) => sort,
        };
        Filters::new(page, page_size, sort, sort_safelist)
    }
}

fn read_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|csv| {
            csv.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn read_int(value: Option<&str>, default: i64, field: &str, v: &mut Validator) -> i64 {
    match value {
        None | Some("") => default,
        Some(s) => s.parse().unwrap_or_else(|_| {
            v.add_error(field, "must be an integer value");
            default
        }),
    }
}

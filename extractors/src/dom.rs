use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

pub(crate) static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
pub(crate) static THEAD: Lazy<Selector> = Lazy::new(|| selector("thead"));
pub(crate) static TR: Lazy<Selector> = Lazy::new(|| selector("tr"));
pub(crate) static TH: Lazy<Selector> = Lazy::new(|| selector("th"));

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css}: {e:?}"))
}

/// Visible text of an element with whitespace runs collapsed to single spaces
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Direct child cells of a row whose tag name is one of `names`
pub fn row_cells<'a>(row: &ElementRef<'a>, names: &[&str]) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| names.contains(&cell.value().name()))
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = Html::parse_fragment("<div>  Juan \n <b>Pérez</b>\t López </div>");
        let div = html.select(&selector("div")).next().unwrap();
        assert_eq!(element_text(&div), "Juan Pérez López");
    }

    #[test]
    fn test_row_cells_only_direct_children() {
        let html = Html::parse_document(
            "<table><tr><td>A</td><th>B</th><td><table><tr><td>inner</td></tr></table></td></tr></table>",
        );
        let row = html.select(&TR).next().unwrap();
        assert_eq!(row_cells(&row, &["td"]).len(), 2);
        assert_eq!(row_cells(&row, &["td", "th"]).len(), 3);
    }
}

use std::sync::Arc;

use scraper::{Html, Selector};
use tokio::task::spawn_blocking;

use crate::{Error, Result};

/// Rendered instead of the results container when the site has nothing for
/// the id.
const ERROR_CONTAINER: &str = r#"div[class="error-container"]"#;
const SEARCH_CONTAINER: &str = r#"div[id="searchCedula"]"#;
const ACTA_IMG: &str = r#"img[class="img-fluid responsive-img"]"#;

/// What a document page turned out to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classification {
    /// The results container held an image; payload is its `src`.
    ImageFound(String),
    /// The results container was present but had no image.
    ImageAbsent,
    /// The site rendered its error page.
    ErrorPage,
}

/// Classifies a fetched page, running the DOM work on a blocking thread.
pub(crate) async fn classify_page(html: Arc<String>) -> Result<Classification> {
    spawn_blocking(move || classify(&html)).await?
}

/// Order matters: the error page renders without the results container, so
/// the error check has to come first. A page with neither marker is a fetch
/// failure, surfaced as a missing-selector error.
fn classify(html: &str) -> Result<Classification> {
    let doc = Html::parse_document(html);

    let error_selector = create_selector(ERROR_CONTAINER)?;
    if doc.select(&error_selector).next().is_some() {
        return Ok(Classification::ErrorPage);
    }

    let container_selector = create_selector(SEARCH_CONTAINER)?;
    let Some(container) = doc.select(&container_selector).next() else {
        return Err(Error::ParseMissingSelector(SEARCH_CONTAINER.into()));
    };

    let img_selector = create_selector(ACTA_IMG)?;
    let src = container
        .select(&img_selector)
        .next()
        .and_then(|img| img.value().attr("src"));
    match src {
        Some(src) => Ok(Classification::ImageFound(src.to_owned())),
        None => Ok(Classification::ImageAbsent),
    }
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUND_PAGE: &str = r#"
        <html><body>
            <div id="searchCedula">
                <img class="img-fluid responsive-img" src="/img/x.jpg">
            </div>
        </body></html>"#;

    const EMPTY_PAGE: &str = r#"
        <html><body>
            <div id="searchCedula">
                <p>Sin resultados</p>
            </div>
        </body></html>"#;

    const ERROR_PAGE: &str = r#"
        <html><body>
            <div class="error-container">404</div>
            <div id="searchCedula">
                <img class="img-fluid responsive-img" src="/img/x.jpg">
            </div>
        </body></html>"#;

    #[test]
    fn image_with_src_is_found() {
        let got = classify(FOUND_PAGE).unwrap();
        assert_eq!(got, Classification::ImageFound("/img/x.jpg".to_owned()));
    }

    #[test]
    fn container_without_image_is_absent() {
        let got = classify(EMPTY_PAGE).unwrap();
        assert_eq!(got, Classification::ImageAbsent);
    }

    #[test]
    fn error_container_wins_regardless_of_other_content() {
        let got = classify(ERROR_PAGE).unwrap();
        assert_eq!(got, Classification::ErrorPage);
    }

    #[test]
    fn image_without_src_is_absent() {
        let html = r#"<div id="searchCedula"><img class="img-fluid responsive-img"></div>"#;
        assert_eq!(classify(html).unwrap(), Classification::ImageAbsent);
    }

    #[test]
    fn missing_container_is_an_error() {
        let err = classify("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, Error::ParseMissingSelector(_)));
    }

    #[tokio::test]
    async fn classify_page_runs_off_the_async_thread() {
        let got = classify_page(Arc::new(FOUND_PAGE.to_owned())).await.unwrap();
        assert_eq!(got, Classification::ImageFound("/img/x.jpg".to_owned()));
    }
}

//! Extractors for Discuz-style forums
//!
//! Discuz search results render one `li.pbw` row per post with the link in
//! `h3.search_title`, and signal exhausted results with an apology banner
//! in `p.emp`. Post pages carry the subject in `#thread_subject`, the body
//! in `.firstpost`, and replies in `.comiis_viewbox` containers paginated
//! through an `a.nxt` link.

use crate::crawler::{
    ExtractError, ListExtractor, ListPage, PostExtractor, PostFields, PostPage, ReplyPage,
};
use crate::storage::ReplyRecord;
use crate::timeparse::normalize;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Marker text on the results-exhausted banner
const NO_MORE_RESULTS: &str = "抱歉";

/// Marker text on the redirect interstitial shown for removed posts
const REDIRECT_NOTICE: &str = "自动跳转";

/// Listing-page extractor for Discuz search results
pub struct DiscuzListExtractor;

impl ListExtractor for DiscuzListExtractor {
    fn extract(&self, page: &str, base: &Url) -> Result<ListPage, ExtractError> {
        let document = Html::parse_document(page);

        if let Ok(empty_selector) = Selector::parse("p.emp") {
            for element in document.select(&empty_selector) {
                let text: String = element.text().collect();
                if text.contains(NO_MORE_RESULTS) {
                    return Ok(ListPage::EndOfResults);
                }
            }
        }

        let row_selector = Selector::parse("li.pbw")
            .map_err(|e| ExtractError::ParseFailure(e.to_string()))?;
        let link_selector = Selector::parse("h3.search_title a")
            .map_err(|e| ExtractError::ParseFailure(e.to_string()))?;

        let mut rows = 0;
        let mut links = Vec::new();
        for row in document.select(&row_selector) {
            rows += 1;
            if let Some(anchor) = row.select(&link_selector).next() {
                if let Some(href) = anchor.value().attr("href") {
                    if let Some(absolute) = resolve_link(href, base) {
                        links.push(absolute);
                    }
                }
            }
        }

        if rows == 0 {
            return Err(ExtractError::ParseFailure(
                "no listing rows found".to_string(),
            ));
        }

        Ok(ListPage::Links(links))
    }
}

/// Post-page extractor for Discuz threads
pub struct DiscuzPostExtractor;

impl PostExtractor for DiscuzPostExtractor {
    fn extract_post(&self, page: &str) -> Result<PostPage, ExtractError> {
        let document = Html::parse_document(page);

        // Removed or permission-gated posts render a redirect interstitial
        // instead of content; that is an empty outcome, not a failure.
        if let Ok(notice_selector) = Selector::parse("#ShowDiv") {
            if let Some(notice) = document.select(&notice_selector).next() {
                let text: String = notice.text().collect();
                if text.contains(REDIRECT_NOTICE) {
                    return Ok(PostPage::NoContent);
                }
            }
        }

        let title = select_text(&document, "#thread_subject");
        let content = select_text(&document, ".firstpost");

        let content = match content {
            Some(content) if !content.is_empty() => content,
            _ => {
                return Err(ExtractError::ParseFailure(
                    "post body not found".to_string(),
                ))
            }
        };

        let time_text = select_text(&document, "[id^=authorposton]").unwrap_or_default();

        let (author, author_link) = document
            .select(&parse_selector("span[id^=comiis_authi_author_div] a.kmxi2")?)
            .next()
            .map(|a| {
                (
                    element_text(&a),
                    a.value().attr("href").map(str::to_string),
                )
            })
            .unwrap_or_default();

        Ok(PostPage::Post(PostFields {
            title,
            time: normalize(&time_text, Utc::now()),
            author,
            author_link,
            content,
        }))
    }

    fn extract_replies(&self, page: &str, base: &Url) -> Result<ReplyPage, ExtractError> {
        let document = Html::parse_document(page);

        let container_selector = parse_selector(".comiis_viewbox")?;
        let first_post_selector = parse_selector(".firstpost")?;
        let message_selector = parse_selector(".post_message")?;
        let time_selector = parse_selector("[id^=authorposton]")?;
        let commenter_selector = parse_selector(".authi a")?;

        let mut replies = Vec::new();
        for container in document.select(&container_selector) {
            // The opening post shares the container markup; only reply
            // containers lack a .firstpost body.
            if container.select(&first_post_selector).next().is_some() {
                continue;
            }

            let Some(message) = container.select(&message_selector).next() else {
                continue;
            };
            let content = element_text(&message);
            if content.is_empty() {
                continue;
            }

            let time_text = container
                .select(&time_selector)
                .next()
                .map(|e| element_text(&e))
                .unwrap_or_default();

            let (commenter, commenter_link) = container
                .select(&commenter_selector)
                .find(|a| {
                    a.value()
                        .attr("href")
                        .is_some_and(|href| href.contains("home.php?mod=space&uid="))
                })
                .map(|a| {
                    (
                        Some(element_text(&a)),
                        a.value().attr("href").map(str::to_string),
                    )
                })
                .unwrap_or((None, None));

            replies.push(ReplyRecord {
                content,
                time: normalize(&time_text, Utc::now()),
                commenter,
                commenter_link,
            });
        }

        let next_page = document
            .select(&parse_selector("a.nxt")?)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.contains("page"))
            .and_then(|href| resolve_link(href, base));

        Ok(ReplyPage { replies, next_page })
    }
}

fn parse_selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::ParseFailure(e.to_string()))
}

/// Trimmed text of the first element matching the selector
fn select_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|e| element_text(&e))
        .filter(|s| !s.is_empty())
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolves an href against the base URL, keeping only http(s) results
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeparse::TimeValue;

    fn base() -> Url {
        Url::parse("https://www.f-example.com/").unwrap()
    }

    const LISTING: &str = r#"
        <html><body><ul>
            <li class="pbw">
                <h3 class="search_title"><a href="thread-111-1-1.html">Post one</a></h3>
                <p>snippet</p>
            </li>
            <li class="pbw">
                <h3 class="search_title"><a href="https://www.f-example.com/thread-222-1-1.html">Post two</a></h3>
            </li>
        </ul></body></html>"#;

    #[test]
    fn test_listing_links_resolved_against_base() {
        let result = DiscuzListExtractor.extract(LISTING, &base()).unwrap();
        assert_eq!(
            result,
            ListPage::Links(vec![
                "https://www.f-example.com/thread-111-1-1.html".to_string(),
                "https://www.f-example.com/thread-222-1-1.html".to_string(),
            ])
        );
    }

    #[test]
    fn test_listing_end_of_results() {
        let page = r#"<html><body><p class="emp">抱歉，没有找到更多结果</p></body></html>"#;
        let result = DiscuzListExtractor.extract(page, &base()).unwrap();
        assert_eq!(result, ListPage::EndOfResults);
    }

    #[test]
    fn test_listing_without_rows_is_parse_failure() {
        let page = "<html><body><div>unexpected layout</div></body></html>";
        let result = DiscuzListExtractor.extract(page, &base());
        assert!(matches!(result, Err(ExtractError::ParseFailure(_))));
    }

    const POST: &str = r#"
        <html><body>
            <span id="thread_subject">Stay report</span>
            <div class="comiis_viewbox">
                <span id="comiis_authi_author_div_1"><a class="kmxi2" href="https://www.f-example.com/home.php?mod=space&uid=42">traveler</a></span>
                <em id="authorposton_1">发表于 2024-01-02 03:04:05</em>
                <div class="firstpost">Great location, thin walls.</div>
            </div>
            <div class="comiis_viewbox">
                <div class="authi l"><a href="https://www.f-example.com/home.php?mod=space&uid=7">replier</a></div>
                <em id="authorposton_2">3 小时前</em>
                <div class="post_message">Agreed about the walls.</div>
            </div>
            <a class="nxt" href="thread-111-2-1.html?page=2">next</a>
        </body></html>"#;

    #[test]
    fn test_post_fields_extracted() {
        let result = DiscuzPostExtractor.extract_post(POST).unwrap();
        let PostPage::Post(fields) = result else {
            panic!("expected a post");
        };

        assert_eq!(fields.title.as_deref(), Some("Stay report"));
        assert_eq!(fields.content, "Great location, thin walls.");
        assert_eq!(fields.author, "traveler");
        assert_eq!(
            fields.author_link.as_deref(),
            Some("https://www.f-example.com/home.php?mod=space&uid=42")
        );
        // The absolute timestamp maps to a fixed epoch.
        assert_eq!(
            fields.time,
            TimeValue::Epoch(1704164645)
        );
    }

    #[test]
    fn test_redirect_notice_is_no_content() {
        let page = r#"<html><body><div id="ShowDiv">如果您的浏览器没有自动跳转，请点击此链接</div></body></html>"#;
        let result = DiscuzPostExtractor.extract_post(page).unwrap();
        assert_eq!(result, PostPage::NoContent);
    }

    #[test]
    fn test_missing_body_is_parse_failure() {
        let page = "<html><body><span id='thread_subject'>Title only</span></body></html>";
        let result = DiscuzPostExtractor.extract_post(page);
        assert!(matches!(result, Err(ExtractError::ParseFailure(_))));
    }

    #[test]
    fn test_replies_skip_opening_post() {
        let result = DiscuzPostExtractor.extract_replies(POST, &base()).unwrap();

        assert_eq!(result.replies.len(), 1);
        assert_eq!(result.replies[0].content, "Agreed about the walls.");
        assert_eq!(result.replies[0].commenter.as_deref(), Some("replier"));
        assert_eq!(
            result.next_page.as_deref(),
            Some("https://www.f-example.com/thread-111-2-1.html?page=2")
        );
    }

    #[test]
    fn test_last_reply_page_has_no_next() {
        let page = r#"
            <html><body>
                <div class="comiis_viewbox">
                    <em id="authorposton_9">昨天 08:15</em>
                    <div class="post_message">Final word.</div>
                </div>
            </body></html>"#;
        let result = DiscuzPostExtractor.extract_replies(page, &base()).unwrap();

        assert_eq!(result.replies.len(), 1);
        assert_eq!(result.replies[0].commenter, None);
        assert!(result.next_page.is_none());
    }
}

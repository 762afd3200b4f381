use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use super::base;
use super::normalize;
use crate::models::EventKind;

static CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.event.clearfix.box-primary.preview-highlighter")
        .expect("event container selector")
});
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.event-title").expect("event title selector"));
static IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.event-image img").expect("event image selector"));
static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul.event-meta").expect("event meta selector"));
static LOCATION_META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul.event-meta.clearfix").expect("location meta selector"));
static META_ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li").expect("meta item selector"));
static ENTRY_COST_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"span[data-rel="multiCurrency"]"#).expect("entry cost selector")
});
static DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.event-content.breakable p").expect("description selector")
});
static BUTTON_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.event-btns a").expect("button link selector"));

/// Date/time fields pulled from the metadata list of one listing.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub start_date: String,
    pub start_time: Option<String>,
    pub kind: EventKind,
}

pub fn containers<'a>(document: &'a Html) -> Vec<ElementRef<'a>> {
    document.select(&CONTAINER_SELECTOR).collect()
}

pub fn title(card: &ElementRef<'_>) -> Option<String> {
    base::first_text(card, &TITLE_SELECTOR)
}

/// Candidate image URL for the listing. Lazy-load sources take priority
/// over the placeholder `src` the page ships.
pub fn thumbnail_candidate(card: &ElementRef<'_>) -> Option<String> {
    let img = card.select(&IMAGE_SELECTOR).next()?;
    let lazy = img
        .value()
        .attr("data-src")
        .map(str::trim)
        .filter(|value| !value.is_empty());
    lazy.or_else(|| {
        img.value()
            .attr("src")
            .map(str::trim)
            .filter(|value| !value.is_empty())
    })
    .map(str::to_string)
}

/// Scan the metadata list items in document order, keeping the first
/// date-shaped and first time-shaped substring of each item. The first
/// date becomes the start date; a second, distinct date marks the event
/// as multi-day.
pub fn schedule(card: &ElementRef<'_>) -> Schedule {
    let mut dates: Vec<String> = Vec::new();
    let mut times: Vec<String> = Vec::new();

    if let Some(meta) = card.select(&META_SELECTOR).next() {
        for item in meta.select(&META_ITEM_SELECTOR) {
            let text = base::inner_text(item);
            if let Some(date) = normalize::find_first_date(&text) {
                dates.push(date);
            }
            if let Some(time) = normalize::find_first_time(&text) {
                times.push(time);
            }
        }
    }

    let kind = match (dates.first(), dates.get(1)) {
        (Some(first), Some(second)) if first != second => EventKind::MultiDay,
        _ => EventKind::SingleDay,
    };
    let start_date = dates
        .first()
        .map(|date| normalize::normalize_date(date))
        .unwrap_or_default();

    Schedule {
        start_date,
        start_time: times.first().cloned(),
        kind,
    }
}

/// The location lives in the last metadata list item, mixed in with an
/// icon element whose text must not leak into the value.
pub fn location(card: &ElementRef<'_>) -> Option<String> {
    let meta = card.select(&LOCATION_META_SELECTOR).next()?;
    let last_item = meta.select(&META_ITEM_SELECTOR).last()?;

    let mut parts: Vec<String> = Vec::new();
    for child in last_item.children() {
        match child.value() {
            Node::Text(text) => parts.push(text.text.to_string()),
            Node::Element(element) if element.name() == "i" => {}
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    parts.push(element.text().collect::<Vec<_>>().join(" "));
                }
            }
            _ => {}
        }
    }

    let location = base::clean_text(&parts.join(" "));
    if location.is_empty() {
        None
    } else {
        Some(location)
    }
}

pub fn entry_cost(card: &ElementRef<'_>) -> Option<String> {
    base::first_text(card, &ENTRY_COST_SELECTOR)
}

pub fn description(card: &ElementRef<'_>) -> Option<String> {
    base::first_text(card, &DESCRIPTION_SELECTOR)
}

/// Href of the first button anchor whose accessible label contains
/// `label` (case-insensitive), absolutized against the page URL and
/// unwrapped if it points through the site's redirect shim.
pub fn labeled_link(card: &ElementRef<'_>, page_url: &str, label: &str) -> Option<String> {
    let needle = label.to_lowercase();
    let anchor = card.select(&BUTTON_LINK_SELECTOR).find(|anchor| {
        anchor
            .value()
            .attr("aria-label")
            .map(|aria| aria.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })?;
    let href = anchor.value().attr("href")?.to_string();
    let absolute = base::absolute_url(page_url, Some(href.clone())).unwrap_or(href);
    Some(unwrap_redirect(&absolute))
}

/// The source wraps outbound links in `external_redirect.php?…&url=<dest>`.
/// Pull out the decoded destination; anything else passes through verbatim.
pub fn unwrap_redirect(href: &str) -> String {
    if !href.contains("external_redirect.php") {
        return href.to_string();
    }
    if let Ok(url) = reqwest::Url::parse(href) {
        if let Some((_, destination)) = url.query_pairs().find(|(key, _)| key == "url") {
            return destination.into_owned();
        }
    }
    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://615cb23714593.site123.me/events";

    const FULL_CARD: &str = r#"
    <div class="event clearfix box-primary preview-highlighter">
        <div class="event-image">
            <img src="/assets/placeholder.gif" data-src="https://cdn.site123.me/uploads/poster-march.jpg">
        </div>
        <div class="event-title"> March  Mega Meet </div>
        <ul class="event-meta clearfix">
            <li><i class="icon-calendar"></i> 05/12/2024</li>
            <li><i class="icon-calendar"></i> 07/12/2024</li>
            <li><i class="icon-clock"></i> From 10:30</li>
            <li><i class="icon-location">pin</i> Village  Hall, <span>High Street</span></li>
        </ul>
        <span data-rel="multiCurrency">£10</span>
        <div class="event-content breakable">
            <p>Big  annual meetup.</p>
            <p>Second paragraph is ignored.</p>
        </div>
        <div class="event-btns">
            <a aria-label="Buy Now: March Mega Meet"
               href="https://615cb23714593.site123.me/external_redirect.php?x=1&amp;url=https%3A%2F%2Fexample.com%2Fa">Buy Now</a>
            <a aria-label="Read More" href="/events/march-mega-meet">Read More</a>
        </div>
    </div>
    "#;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn containers_match_the_full_marker_class_set() {
        let document = parse(FULL_CARD);
        assert_eq!(containers(&document).len(), 1);

        let document = parse(r#"<div class="event box-primary">not a listing</div>"#);
        assert!(containers(&document).is_empty());
    }

    #[test]
    fn extracts_title_and_schedule() {
        let document = parse(FULL_CARD);
        let card = containers(&document)[0];

        assert_eq!(title(&card).as_deref(), Some("March Mega Meet"));

        let schedule = schedule(&card);
        assert_eq!(schedule.start_date, "2024-12-05");
        assert_eq!(schedule.start_time.as_deref(), Some("10:30"));
        assert_eq!(schedule.kind, EventKind::MultiDay);
    }

    #[test]
    fn same_date_twice_stays_single_day() {
        let html = FULL_CARD.replace("07/12/2024", "05/12/2024");
        let document = parse(&html);
        let card = containers(&document)[0];
        assert_eq!(schedule(&card).kind, EventKind::SingleDay);
    }

    #[test]
    fn no_dates_yields_empty_start_date() {
        let html = r#"
        <div class="event clearfix box-primary preview-highlighter">
            <div class="event-title">Sometime Soon</div>
            <ul class="event-meta clearfix"><li><i></i> The back room</li></ul>
        </div>
        "#;
        let document = parse(html);
        let card = containers(&document)[0];
        let schedule = schedule(&card);
        assert_eq!(schedule.start_date, "");
        assert_eq!(schedule.start_time, None);
        assert_eq!(schedule.kind, EventKind::SingleDay);
    }

    #[test]
    fn thumbnail_prefers_lazy_source() {
        let document = parse(FULL_CARD);
        let card = containers(&document)[0];
        assert_eq!(
            thumbnail_candidate(&card).as_deref(),
            Some("https://cdn.site123.me/uploads/poster-march.jpg")
        );

        let html = FULL_CARD.replace(" data-src=\"https://cdn.site123.me/uploads/poster-march.jpg\"", "");
        let document = parse(&html);
        let card = containers(&document)[0];
        assert_eq!(
            thumbnail_candidate(&card).as_deref(),
            Some("/assets/placeholder.gif")
        );
    }

    #[test]
    fn location_drops_icon_text_and_collapses_whitespace() {
        let document = parse(FULL_CARD);
        let card = containers(&document)[0];
        assert_eq!(
            location(&card).as_deref(),
            Some("Village Hall, High Street")
        );
    }

    #[test]
    fn missing_location_is_none() {
        let html = r#"
        <div class="event clearfix box-primary preview-highlighter">
            <div class="event-title">Nowhere</div>
            <ul class="event-meta clearfix"><li><i class="icon-location">pin</i>   </li></ul>
        </div>
        "#;
        let document = parse(html);
        let card = containers(&document)[0];
        assert_eq!(location(&card), None);
    }

    #[test]
    fn extracts_cost_and_first_description_paragraph() {
        let document = parse(FULL_CARD);
        let card = containers(&document)[0];
        assert_eq!(entry_cost(&card).as_deref(), Some("£10"));
        assert_eq!(description(&card).as_deref(), Some("Big annual meetup."));
    }

    #[test]
    fn buy_now_link_is_unwrapped_from_the_redirect_shim() {
        let document = parse(FULL_CARD);
        let card = containers(&document)[0];
        assert_eq!(
            labeled_link(&card, PAGE_URL, "buy now").as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn read_more_link_is_absolutized_verbatim() {
        let document = parse(FULL_CARD);
        let card = containers(&document)[0];
        assert_eq!(
            labeled_link(&card, PAGE_URL, "read more").as_deref(),
            Some("https://615cb23714593.site123.me/events/march-mega-meet")
        );
        assert_eq!(labeled_link(&card, PAGE_URL, "sign up"), None);
    }

    #[test]
    fn unwrap_redirect_leaves_other_urls_alone() {
        assert_eq!(
            unwrap_redirect("https://example.com/tickets?url=nope"),
            "https://example.com/tickets?url=nope"
        );
        assert_eq!(
            unwrap_redirect(
                "https://site.example/external_redirect.php?x=1&url=https%3A%2F%2Fexample.com%2Fa"
            ),
            "https://example.com/a"
        );
        // Wrapper without a url parameter stays as-is.
        assert_eq!(
            unwrap_redirect("https://site.example/external_redirect.php?x=1"),
            "https://site.example/external_redirect.php?x=1"
        );
    }
}

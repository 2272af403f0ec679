mod common;

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use announcement_crawler::{Crawler, Keywords, SiteCatalog};
use common::{listing_url, options, page, persisted, site, Script};
use tokio_util::sync::CancellationToken;
use tracing::{
    field::{Field, Visit},
    span, Subscriber,
};
use tracing_subscriber::{layer::Context, prelude::*, Layer};

/// Records the name and `site` field of every span opened.
#[derive(Clone, Default)]
struct SpanRecorder {
    spans: Arc<Mutex<Vec<(String, String)>>>,
}

struct SiteField(String);

impl Visit for SiteField {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "site" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for SpanRecorder {
    fn on_new_span(&self, attrs: &span::Attributes<'_>, _id: &span::Id, _ctx: Context<'_, S>) {
        let mut site = SiteField(String::new());
        attrs.record(&mut site);
        self.spans
            .lock()
            .unwrap()
            .push((attrs.metadata().name().to_string(), site.0));
    }
}

#[tokio::test]
async fn every_site_crawl_runs_in_a_span_named_after_the_site() {
    let recorder = SpanRecorder::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(recorder.clone()));
    let script = Script::default();
    script
        .listing(&listing_url("a"), vec![page(&["a0"])])
        .listing(&listing_url("b"), vec![page(&["b0"])]);

    let report = Crawler::new(Keywords::default(), options())
        .run(
            &script.factory(),
            &persisted(&[]),
            &SiteCatalog::new(vec![site("a"), site("b")]).unwrap(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(report.total_articles(), 2);

    let site_spans: Vec<String> = recorder
        .spans
        .lock()
        .unwrap()
        .iter()
        .filter(|(name, _)| name == "site")
        .map(|(_, site)| site.clone())
        .collect();
    assert_eq!(site_spans, ["a", "b"]);
}

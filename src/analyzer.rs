//! Page-structure analysis for the admin visual map.
//!
//! One top-to-bottom pass over the rendered HTML picks out at most one
//! scarcity banner, one hero heading, one video player and every distinct
//! call-to-action, numbering them in discovery order. Any failure (fetch,
//! status, policy compile) yields [`AnalysisResult::empty`].

pub mod fetch;
pub mod money;
pub mod policy;

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html};
use tracing::{info, warn};
use url::Url;

use crate::types::{AnalysisResult, ColorTag, ElementKind, PageRole, VslElement};
use fetch::PageFetcher;
use money::{extract_value, round2};
use policy::{ClassificationPolicy, CompiledPolicy};

pub struct Analyzer<F> {
    fetcher: F,
    origin: Url,
    policy: ClassificationPolicy,
    fetch_timeout: Duration,
}

impl<F: PageFetcher> Analyzer<F> {
    pub fn new(fetcher: F, origin: &str) -> Result<Self> {
        let origin = Url::parse(origin).with_context(|| format!("invalid site origin: {origin}"))?;
        Ok(Self {
            fetcher,
            origin,
            policy: ClassificationPolicy::default(),
            fetch_timeout: Duration::from_secs(10),
        })
    }

    pub fn with_policy(mut self, policy: ClassificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn page_url(&self, role: PageRole) -> Result<Url> {
        self.origin
            .join(role.path())
            .with_context(|| format!("joining {} onto {}", role.path(), self.origin))
    }

    /// Fetch the page for `role` and classify it. Never fails.
    pub async fn analyze(&self, role: PageRole) -> AnalysisResult {
        let html = match self.fetch_html(role).await {
            Ok(html) => html,
            Err(e) => {
                warn!(page = role.key_prefix(), error = %format!("{e:#}"), "page fetch failed; no analysis data");
                return AnalysisResult::empty();
            }
        };
        match analyze_document(&html, &self.policy, self.origin.host_str()) {
            Ok(result) => {
                info!(
                    page = role.key_prefix(),
                    elements = result.elements.len(),
                    offers = result.total_offers,
                    ticket = result.ticket_average,
                    "page analyzed"
                );
                result
            }
            Err(e) => {
                warn!(page = role.key_prefix(), error = %format!("{e:#}"), "page analysis failed");
                AnalysisResult::empty()
            }
        }
    }

    async fn fetch_html(&self, role: PageRole) -> Result<String> {
        let url = self.page_url(role)?;
        let page = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(url.as_str()))
            .await
            .with_context(|| format!("fetch of {url} timed out after {:?}", self.fetch_timeout))??;
        if !page.ok() {
            anyhow::bail!("fetch of {url} returned HTTP {}", page.status);
        }
        Ok(page.body)
    }
}

/// Classify an already-fetched document. With no site host known, any absolute
/// http(s) anchor counts as external.
pub fn analyze_html(html: &str, policy: &ClassificationPolicy) -> Result<AnalysisResult> {
    analyze_document(html, policy, None)
}

/// Classify a document served from `site_host`; anchors back to that host are
/// treated as internal navigation.
pub fn analyze_document(html: &str, policy: &ClassificationPolicy, site_host: Option<&str>) -> Result<AnalysisResult> {
    let compiled = policy.compile()?;
    let document = Html::parse_document(html);
    Ok(scan(&document, &compiled, site_host))
}

fn scan(document: &Html, policy: &CompiledPolicy, site_host: Option<&str>) -> AnalysisResult {
    let mut elements = Scan::default();
    let rules = &policy.rules;

    // Scarcity: first selector hit with enough text.
    'scarcity: for sel in &policy.scarcity {
        for el in document.select(sel) {
            let text = element_text(&el);
            if text.chars().count() > rules.scarcity.min_chars {
                elements.push(ElementKind::Scarcity, truncate(&text, rules.scarcity.max_chars), None, None, rules.scarcity.color);
                break 'scarcity;
            }
        }
    }

    // Hero: first heading, plus the block right after it.
    if let Some(h1) = policy.hero.iter().find_map(|sel| document.select(sel).next()) {
        let sub_text = h1
            .next_siblings()
            .find_map(ElementRef::wrap)
            .filter(|next| rules.hero.sub_tags.iter().any(|t| t.eq_ignore_ascii_case(next.value().name())))
            .map(|next| element_text(&next))
            .filter(|t| !t.is_empty())
            .map(|t| truncate(&t, rules.hero.sub_max_chars));
        elements.push(ElementKind::Hero, element_text(&h1), sub_text, None, rules.hero.color);
    }

    if policy.video.iter().any(|sel| document.select(sel).next().is_some()) {
        elements.push(ElementKind::Video, rules.video.label.clone(), None, None, rules.video.color);
    }

    let mut seen: HashSet<String> = HashSet::new();
    for el in document.select(&policy.cta) {
        let text = element_text(&el);
        if text.chars().count() < rules.cta.min_chars
            || rules.cta.reject_markers.iter().any(|m| text.contains(m.as_str()))
            || seen.contains(&text)
        {
            continue;
        }
        if el.value().name() == "a"
            && !is_external_link(el.value().attr("href"), site_host)
            && !has_class_marker(&el, &rules.cta.class_markers)
        {
            continue;
        }
        let value = extract_value(el, &policy.money);
        elements.push(ElementKind::Cta, truncate(&text, rules.cta.max_chars), None, value, rules.cta.color);
        seen.insert(text);
    }

    elements.finish()
}

#[derive(Default)]
struct Scan {
    elements: Vec<VslElement>,
}

impl Scan {
    fn push(&mut self, kind: ElementKind, text: String, sub_text: Option<String>, value: Option<f64>, color_tag: ColorTag) {
        let order = self.elements.len() as u32 + 1;
        self.elements.push(VslElement { kind, text, sub_text, value, order, color_tag });
    }

    fn finish(self) -> AnalysisResult {
        let values: Vec<f64> = self
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Cta)
            .filter_map(|e| e.value)
            .collect();
        let ticket_average = if values.is_empty() {
            0.0
        } else {
            round2(values.iter().sum::<f64>() / values.len() as f64)
        };
        AnalysisResult { elements: self.elements, ticket_average, total_offers: values.len() }
    }
}

/// Visible text with runs of whitespace collapsed.
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

fn is_external_link(href: Option<&str>, site_host: Option<&str>) -> bool {
    let Some(url) = href.and_then(|h| Url::parse(h.trim()).ok()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match (url.host_str(), site_host) {
        (Some(host), Some(site)) => bare_host(host) != bare_host(site),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn bare_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn has_class_marker(el: &ElementRef<'_>, markers: &[String]) -> bool {
    let class = el.value().attr("class").unwrap_or_default().to_ascii_lowercase();
    markers.iter().any(|m| class.contains(&m.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::fetch::FetchedPage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SALES_PAGE: &str = r#"<!doctype html>
<html><body>
  <nav><a href="/admin">Admin</a><a href="/login">Login</a><a href="/sobre">Sobre nós</a></nav>
  <div class="bg-red-600 text-white">Oferta</div>
  <div class="scarcity-bar bg-red-600">ATENÇÃO: esta página sai do ar hoje às 23:59, garanta já a sua vaga com desconto</div>
  <section>
    <h1>O Método que mudou tudo</h1>
    <p>Assista ao vídeo completo e descubra como vender todos os dias pela internet</p>
  </section>
  <div class="aspect-video"><iframe src="https://player.vimeo.com/video/1"></iframe></div>
  <div class="plan"><span>Básico R$ 13,90</span><div><button>Quero o Básico</button></div></div>
  <div class="plan"><div><a class="btn" href="https://pay.example.com/checkout/2">Quero o Completo R$ 24,90</a></div></div>
  <div class="plan"><a class="cta-pulse" href="/checkout/3">Levar o Premium por R$ 24,90</a></div>
  <button>Quero o Básico</button>
  <button>OK</button>
  <a href="/checkout/internal">Checkout interno</a>
  <footer><div><button>Falar no WhatsApp</button></div></footer>
</body></html>"#;

    fn analyze(html: &str) -> AnalysisResult {
        analyze_html(html, &ClassificationPolicy::default()).unwrap()
    }

    #[test]
    fn sales_page_structure() {
        let result = analyze(SALES_PAGE);
        let kinds: Vec<ElementKind> = result.elements.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Scarcity,
                ElementKind::Hero,
                ElementKind::Video,
                ElementKind::Cta,
                ElementKind::Cta,
                ElementKind::Cta,
                ElementKind::Cta,
            ]
        );

        let scarcity = &result.elements[0];
        assert_eq!(scarcity.color_tag, ColorTag::Red);
        assert!(scarcity.text.starts_with("ATENÇÃO: esta página sai do ar"));
        assert!(scarcity.text.ends_with("..."));
        assert!(scarcity.text.chars().count() <= 53);

        let hero = &result.elements[1];
        assert_eq!(hero.text, "O Método que mudou tudo");
        let sub = hero.sub_text.as_deref().unwrap();
        assert!(sub.starts_with("Assista ao vídeo completo"));
        assert!(sub.chars().count() <= 63);

        assert_eq!(result.elements[2].text, "VSL Video Player");
        assert_eq!(result.elements[2].color_tag, ColorTag::Blue);

        let ctas: Vec<(&str, Option<f64>)> = result.elements[3..]
            .iter()
            .map(|e| (e.text.as_str(), e.value))
            .collect();
        assert_eq!(
            ctas,
            vec![
                ("Quero o Básico", Some(13.9)),
                ("Quero o Completo R$ 24,90", Some(24.9)),
                ("Levar o Premium por R$ 24,90", Some(24.9)),
                ("Falar no WhatsApp", None),
            ]
        );
        assert!(result.elements[3..].iter().all(|e| e.color_tag == ColorTag::Green));
    }

    #[test]
    fn ticket_average_over_priced_ctas() {
        let result = analyze(SALES_PAGE);
        assert_eq!(result.total_offers, 3);
        assert_eq!(result.ticket_average, 21.23);
    }

    #[test]
    fn orders_are_contiguous_from_one() {
        let result = analyze(SALES_PAGE);
        let orders: Vec<u32> = result.elements.iter().map(|e| e.order).collect();
        let expected: Vec<u32> = (1..=result.elements.len() as u32).collect();
        assert_eq!(orders, expected);
    }

    #[test]
    fn identical_cta_text_is_kept_once() {
        let result = analyze("<body><button> Comprar agora </button><button>Comprar   agora</button></body>");
        assert_eq!(result.elements.len(), 1);
        assert_eq!(result.elements[0].text, "Comprar agora");
        assert_eq!(result.total_offers, 0);
        assert_eq!(result.ticket_average, 0.0);
    }

    #[test]
    fn long_cta_text_is_truncated() {
        let result = analyze("<body><button>Sim, eu quero garantir o meu acesso vitalício agora mesmo</button></body>");
        let text = &result.elements[0].text;
        assert!(text.ends_with("..."));
        assert_eq!(text.trim_end_matches("...").chars().count(), 40);
    }

    #[test]
    fn internal_links_need_cta_class() {
        let result = analyze(
            r#"<body>
                <a href="/checkout">Ir para checkout</a>
                <a href="https://pay.example.com/x">Pagar agora</a>
                <a class="btn-checkout" href="/checkout">Finalizar compra</a>
            </body>"#,
        );
        let texts: Vec<&str> = result.elements.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Pagar agora", "Finalizar compra"]);
    }

    #[test]
    fn admin_and_login_candidates_are_not_offers() {
        let result = analyze(
            r#"<body>
                <button>Login</button>
                <a class="cta" href="https://x.example.com/panel">Admin panel</a>
                <button>Quero comprar</button>
            </body>"#,
        );
        let texts: Vec<&str> = result.elements.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Quero comprar"]);
    }

    #[test]
    fn same_site_absolute_links_are_internal() {
        let html = r#"<body>
            <a href="https://www.metodovsl.com/checkout/sobre">Conheça o checkout</a>
            <a href="https://pay.example.com/checkout/1">Pagar com cartão</a>
            <a class="cta" href="https://metodovsl.com/checkout/2">Garantir vaga</a>
        </body>"#;
        let policy = ClassificationPolicy::default();
        let result = analyze_document(html, &policy, Some("metodovsl.com")).unwrap();
        let texts: Vec<&str> = result.elements.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Pagar com cartão", "Garantir vaga"]);

        let unanchored = analyze_html(html, &policy).unwrap();
        assert_eq!(unanchored.elements.len(), 3);
    }

    #[test]
    fn hero_without_following_block() {
        let result = analyze("<body><h1>Título</h1><div>não é subtítulo</div></body>");
        assert_eq!(result.elements.len(), 1);
        assert_eq!(result.elements[0].kind, ElementKind::Hero);
        assert_eq!(result.elements[0].sub_text, None);
    }

    #[test]
    fn short_scarcity_text_is_skipped() {
        let result = analyze(r#"<body><div class="countdown">10:00</div></body>"#);
        assert!(result.is_empty());
    }

    #[test]
    fn empty_document_has_no_elements() {
        assert_eq!(analyze(""), AnalysisResult::empty());
    }

    #[test]
    fn invalid_policy_is_an_error() {
        let mut policy = ClassificationPolicy::default();
        policy.cta.selectors = vec!["button[".into()];
        assert!(analyze_html(SALES_PAGE, &policy).is_err());
    }

    struct StubFetcher {
        status: u16,
        body: String,
        requested: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn new(status: u16, body: &str) -> Self {
            Self { status, body: body.to_string(), requested: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(FetchedPage { status: self.status, body: self.body.clone() })
        }
    }

    struct BrokenFetcher;

    #[async_trait]
    impl PageFetcher for BrokenFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            Err(anyhow::anyhow!("connection refused: {url}"))
        }
    }

    struct HangingFetcher;

    #[async_trait]
    impl PageFetcher for HangingFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn analyze_fetches_role_path() {
        let analyzer = Analyzer::new(StubFetcher::new(200, SALES_PAGE), "https://metodovsl.com").unwrap();
        let result = analyzer.analyze(PageRole::Thankyou).await;
        assert_eq!(result.total_offers, 3);
        let requested = analyzer.fetcher.requested.lock().unwrap().clone();
        assert_eq!(requested, vec!["https://metodovsl.com/thankyou".to_string()]);
    }

    #[tokio::test]
    async fn server_error_yields_empty_result() {
        let analyzer = Analyzer::new(StubFetcher::new(500, SALES_PAGE), "http://localhost:3000").unwrap();
        assert_eq!(analyzer.analyze(PageRole::Home).await, AnalysisResult::empty());
    }

    #[tokio::test]
    async fn network_error_yields_empty_result() {
        let analyzer = Analyzer::new(BrokenFetcher, "http://localhost:3000").unwrap();
        let result = analyzer.analyze(PageRole::Home).await;
        assert_eq!(result.elements.len(), 0);
        assert_eq!(result.ticket_average, 0.0);
        assert_eq!(result.total_offers, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let analyzer = Analyzer::new(HangingFetcher, "http://localhost:3000")
            .unwrap()
            .with_fetch_timeout(Duration::from_millis(100));
        assert!(analyzer.analyze(PageRole::Home).await.is_empty());
    }

    #[tokio::test]
    async fn broken_policy_yields_empty_result() {
        let mut policy = ClassificationPolicy::default();
        policy.money_pattern = "(unclosed".into();
        let analyzer = Analyzer::new(StubFetcher::new(200, SALES_PAGE), "http://localhost:3000")
            .unwrap()
            .with_policy(policy);
        assert!(analyzer.analyze(PageRole::Home).await.is_empty());
    }
}

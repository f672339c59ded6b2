//! Incremental list controller.
//!
//! Keeps the accumulated article list for one filter and decides when the
//! next page may be requested. Each trigger is split into a `begin_*` call
//! that hands out a [`Ticket`] and a `complete`/`fail` call that applies the
//! outcome, so the state can be driven from any event loop. The async
//! helpers at the bottom run both halves against a [`HeadlineSource`].

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::models::{Article, Filter, NewsQuery, PageResult};
use crate::upstream::HeadlineSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    More,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading(LoadKind),
    Loaded,
    Exhausted,
    Failed(String),
}

/// Permission to run one fetch. Only the most recently issued ticket of the
/// current filter is accepted back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    kind: LoadKind,
    page: u32,
    query: NewsQuery,
}

impl Ticket {
    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn query(&self) -> &NewsQuery {
        &self.query
    }
}

pub struct ListController {
    filter: Filter,
    phase: Phase,
    articles: Vec<Article>,
    page: u32,
    total_results: u64,
    generation: u64,
    in_flight: Option<Ticket>,
    initial_done: bool,
    progress: u8,
}

impl ListController {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            phase: Phase::Idle,
            articles: Vec::new(),
            page: 1,
            total_results: 0,
            generation: 0,
            in_flight: None,
            initial_done: false,
            progress: 0,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Last page successfully applied.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    /// Loading-bar position, 0 to 100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading(_))
    }

    pub fn has_more(&self) -> bool {
        (self.articles.len() as u64) < self.total_results
    }

    /// Whether a scroll trigger that has rendered `rendered` items should
    /// ask for another page right now.
    pub fn wants_more(&self, rendered: usize) -> bool {
        rendered == self.articles.len() && self.can_load_more()
    }

    fn can_load_more(&self) -> bool {
        self.initial_done
            && matches!(self.phase, Phase::Loaded | Phase::Failed(_))
            && self.has_more()
    }

    /// Swap the active filter. A different filter starts a fresh session:
    /// page 1, empty list, and any fetch still in flight is disowned.
    pub fn set_filter(&mut self, filter: Filter) -> bool {
        if filter == self.filter {
            return false;
        }

        info!(
            "Filter changed to {}/{}, resetting list",
            filter.country, filter.category
        );
        self.filter = filter;
        self.generation += 1;
        self.articles.clear();
        self.page = 1;
        self.total_results = 0;
        self.phase = Phase::Idle;
        self.in_flight = None;
        self.initial_done = false;
        self.progress = 0;
        true
    }

    pub fn begin_initial_load(&mut self) -> Option<Ticket> {
        let retrying = matches!(self.phase, Phase::Failed(_)) && !self.initial_done;
        if self.phase != Phase::Idle && !retrying {
            debug!("Initial load already ran for this filter");
            return None;
        }

        Some(self.issue(LoadKind::Initial, 1))
    }

    pub fn begin_load_more(&mut self) -> Option<Ticket> {
        if !self.can_load_more() {
            debug!(
                "Load more rejected in {:?} ({} of {})",
                self.phase,
                self.articles.len(),
                self.total_results
            );
            return None;
        }

        let Some(next) = self.page.checked_add(1) else {
            warn!("Page counter at {}, not requesting further pages", self.page);
            return None;
        };
        Some(self.issue(LoadKind::More, next))
    }

    fn issue(&mut self, kind: LoadKind, page: u32) -> Ticket {
        let ticket = Ticket {
            generation: self.generation,
            kind,
            page,
            query: self.filter.query(page),
        };
        self.phase = Phase::Loading(kind);
        self.in_flight = Some(ticket.clone());
        self.progress = 10;
        ticket
    }

    fn owns(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && self.in_flight.as_ref() == Some(ticket)
    }

    /// Apply a fetched page. Returns false if the ticket is stale.
    pub fn complete(&mut self, ticket: &Ticket, result: PageResult) -> bool {
        if !self.owns(ticket) {
            warn!("Discarding stale page {} response", ticket.page);
            return false;
        }
        self.progress = 70;

        if ticket.kind == LoadKind::Initial {
            self.articles.clear();
        }

        self.total_results = result.total_results;
        let cap = usize::try_from(self.total_results).unwrap_or(usize::MAX);
        if self.articles.len() > cap {
            warn!(
                "Provider total shrank to {}, trimming list of {}",
                cap,
                self.articles.len()
            );
            self.articles.truncate(cap);
        }

        let mut seen: HashSet<String> = self.articles.iter().map(|a| a.url.clone()).collect();
        let mut added = 0;
        for article in result.articles {
            if self.articles.len() >= cap {
                break;
            }
            if !first_sighting(&mut seen, &article) {
                continue;
            }
            self.articles.push(article);
            added += 1;
        }

        self.page = ticket.page;
        self.initial_done = true;
        self.in_flight = None;
        self.phase = if added == 0 || !self.has_more() {
            Phase::Exhausted
        } else {
            Phase::Loaded
        };
        self.progress = 100;

        info!(
            "Page {} added {} articles ({} of {})",
            ticket.page,
            added,
            self.articles.len(),
            self.total_results
        );
        true
    }

    /// Record a failed fetch. What is already listed stays; the page counter
    /// doesn't move, so the next trigger retries the same page.
    pub fn fail(&mut self, ticket: &Ticket, message: impl Into<String>) -> bool {
        if !self.owns(ticket) {
            return false;
        }

        self.in_flight = None;
        self.phase = Phase::Failed(message.into());
        self.progress = 100;
        true
    }

    /// Run the initial load against `source`. `Ok(false)` means the trigger
    /// was not accepted in the current state.
    pub async fn initial_load<S>(&mut self, source: &S) -> Result<bool, FetchError>
    where
        S: HeadlineSource + ?Sized,
    {
        match self.begin_initial_load() {
            Some(ticket) => self.run(source, ticket).await,
            None => Ok(false),
        }
    }

    pub async fn load_more<S>(&mut self, source: &S) -> Result<bool, FetchError>
    where
        S: HeadlineSource + ?Sized,
    {
        match self.begin_load_more() {
            Some(ticket) => self.run(source, ticket).await,
            None => Ok(false),
        }
    }

    async fn run<S>(&mut self, source: &S, ticket: Ticket) -> Result<bool, FetchError>
    where
        S: HeadlineSource + ?Sized,
    {
        match source.fetch_page(ticket.query()).await {
            Ok(result) => Ok(self.complete(&ticket, result)),
            Err(e) => {
                warn!("Fetching page {} failed: {}", ticket.page, e);
                self.fail(&ticket, e.to_string());
                Err(e)
            }
        }
    }
}

/// Records the article's URL and reports whether it was new. Articles
/// without a URL are never treated as duplicates.
pub fn first_sighting(seen: &mut HashSet<String>, article: &Article) -> bool {
    article.url.is_empty() || seen.insert(article.url.clone())
}

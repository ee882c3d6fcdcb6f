//! Exhaustive paginated fetch for a single square.

use log::{debug, info};

use crate::{
    GeoSquare, PlaceSearch, RateLimiter, ResultSet, SearchError, SearchPage, SearchRequest,
};

/// Upper bound on pages followed for one query.
///
/// The API stops after three pages; a cursor chain longer than this means the
/// service is misbehaving and would otherwise never terminate.
pub const MAX_PAGES_PER_QUERY: usize = 10;

/// Extra waits granted to a cursor the service reports as not yet valid.
pub const PAGE_TOKEN_RETRIES: u32 = 2;

/// Fetch every page of one square's query.
///
/// The first request carries the square's location, coverage radius and
/// keyword. Each follow-up request carries only the cursor and is preceded by
/// one [`RateLimiter::acquire`].
#[derive(Debug)]
pub struct PagedFetcher<'a, S: ?Sized, L: ?Sized> {
    search: &'a S,
    limiter: &'a L,
    keyword: &'a str,
}

impl<'a, S, L> PagedFetcher<'a, S, L>
where
    S: PlaceSearch + ?Sized,
    L: RateLimiter + ?Sized,
{
    /// Construct a fetcher issuing `keyword` queries through `search`.
    pub fn new(search: &'a S, limiter: &'a L, keyword: &'a str) -> Self {
        Self {
            search,
            limiter,
            keyword,
        }
    }

    /// Fetch and merge all pages for `square`.
    ///
    /// # Errors
    ///
    /// Returns the first [`SearchError`] raised by any page, or
    /// [`SearchError::Malformed`] when the cursor chain exceeds
    /// [`MAX_PAGES_PER_QUERY`].
    pub fn fetch(&self, square: &GeoSquare) -> Result<ResultSet, SearchError> {
        let mut results = ResultSet::new();
        let mut request = SearchRequest::Nearby {
            location: square.coordinate_key(),
            radius_meters: square.coverage_radius_meters(),
            keyword: self.keyword.to_owned(),
        };
        let mut pages = 0_usize;
        loop {
            let page = self.search_page(&request)?;
            pages += 1;
            debug!(
                "page {pages} for {} returned {} places",
                square.coordinate_key(),
                page.places.len()
            );
            results.extend(page.places);

            let Some(token) = page.next_page_token.filter(|token| !token.is_empty()) else {
                break;
            };
            if pages >= MAX_PAGES_PER_QUERY {
                return Err(SearchError::Malformed {
                    message: format!("pagination did not end after {pages} pages"),
                });
            }
            self.limiter.acquire();
            request = SearchRequest::NextPage { token };
        }
        info!(
            "found {} places in square {}",
            results.len(),
            square.coordinate_key()
        );
        Ok(results)
    }

    /// Issue one request, waiting out a cursor that has not propagated yet.
    fn search_page(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        let mut retries = 0;
        loop {
            match self.search.search(request) {
                Err(error)
                    if matches!(request, SearchRequest::NextPage { .. })
                        && error.is_pending_page_token()
                        && retries < PAGE_TOKEN_RETRIES =>
                {
                    retries += 1;
                    debug!("page token not ready ({error}); waiting before retry {retries}");
                    self.limiter.acquire();
                }
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingLimiter, ScriptedSearch, places};
    use crate::{Place, SearchPage, Unthrottled};
    use rstest::{fixture, rstest};

    #[fixture]
    fn square() -> GeoSquare {
        GeoSquare::new(37.5, -77.5, 1.0).expect("square")
    }

    #[rstest]
    fn single_page_needs_no_wait(square: GeoSquare) {
        let search = ScriptedSearch::new([Ok(SearchPage::last(places("e", 1..=45)))]);
        let limiter = CountingLimiter::default();

        let results = PagedFetcher::new(&search, &limiter, "restaurant")
            .fetch(&square)
            .expect("fetch");

        assert_eq!(results.len(), 45);
        assert_eq!(search.request_count(), 1);
        assert_eq!(limiter.acquired(), 0);
    }

    #[rstest]
    fn first_request_addresses_square(square: GeoSquare) {
        let search = ScriptedSearch::new([Ok(SearchPage::last(Vec::new()))]);
        PagedFetcher::new(&search, &Unthrottled, "cafe")
            .fetch(&square)
            .expect("fetch");

        let requests = search.requests();
        match &requests[0] {
            SearchRequest::Nearby {
                location,
                radius_meters,
                keyword,
            } => {
                assert_eq!(location, "37.5,-77.5");
                assert!((radius_meters - square.coverage_radius_meters()).abs() < 1e-9);
                assert_eq!(keyword, "cafe");
            }
            other => panic!("expected nearby request, got {other:?}"),
        }
    }

    #[rstest]
    fn follow_up_pages_use_only_the_cursor(square: GeoSquare) {
        let search = ScriptedSearch::new([
            Ok(SearchPage::new(places("a", 1..=20), Some("t1".into()))),
            Ok(SearchPage::new(places("a", 21..=40), Some("t2".into()))),
            Ok(SearchPage::last(places("a", 41..=50))),
        ]);
        let limiter = CountingLimiter::default();

        let results = PagedFetcher::new(&search, &limiter, "restaurant")
            .fetch(&square)
            .expect("fetch");

        assert_eq!(results.len(), 50);
        assert_eq!(limiter.acquired(), 2);
        let requests = search.requests();
        assert_eq!(
            requests[1..],
            [
                SearchRequest::NextPage { token: "t1".into() },
                SearchRequest::NextPage { token: "t2".into() },
            ]
        );
    }

    #[rstest]
    fn duplicate_ids_across_pages_collapse(square: GeoSquare) {
        let search = ScriptedSearch::new([
            Ok(SearchPage::new(vec![Place::with_id("x")], Some("t".into()))),
            Ok(SearchPage::last(vec![Place::with_id("x"), Place::with_id("y")])),
        ]);

        let results = PagedFetcher::new(&search, &Unthrottled, "restaurant")
            .fetch(&square)
            .expect("fetch");

        assert_eq!(results.len(), 2);
    }

    #[rstest]
    fn page_error_aborts_fetch(square: GeoSquare) {
        let search = ScriptedSearch::new([
            Ok(SearchPage::new(places("a", 1..=20), Some("t1".into()))),
            Err(SearchError::Malformed {
                message: "results missing".into(),
            }),
        ]);

        let err = PagedFetcher::new(&search, &Unthrottled, "restaurant")
            .fetch(&square)
            .expect_err("second page fails");

        assert!(matches!(err, SearchError::Malformed { .. }));
    }

    #[rstest]
    fn endless_cursor_chain_is_cut_off(square: GeoSquare) {
        let pages = (0..=MAX_PAGES_PER_QUERY)
            .map(|_| Ok(SearchPage::new(Vec::new(), Some("again".into()))));
        let search = ScriptedSearch::new(pages);

        let err = PagedFetcher::new(&search, &Unthrottled, "restaurant")
            .fetch(&square)
            .expect_err("runaway pagination");

        assert!(matches!(err, SearchError::Malformed { .. }));
        assert_eq!(search.request_count(), MAX_PAGES_PER_QUERY);
    }

    fn token_not_ready() -> SearchError {
        SearchError::Service {
            status: "INVALID_REQUEST".into(),
            message: String::new(),
        }
    }

    #[rstest]
    fn unready_cursor_is_retried_after_another_wait(square: GeoSquare) {
        let search = ScriptedSearch::new([
            Ok(SearchPage::new(places("a", 1..=20), Some("t1".into()))),
            Err(token_not_ready()),
            Ok(SearchPage::last(places("a", 21..=30))),
        ]);
        let limiter = CountingLimiter::default();

        let results = PagedFetcher::new(&search, &limiter, "restaurant")
            .fetch(&square)
            .expect("fetch");

        assert_eq!(results.len(), 30);
        assert_eq!(limiter.acquired(), 2);
        assert_eq!(
            search.requests()[1..],
            [
                SearchRequest::NextPage { token: "t1".into() },
                SearchRequest::NextPage { token: "t1".into() },
            ]
        );
    }

    #[rstest]
    fn cursor_that_never_becomes_ready_fails(square: GeoSquare) {
        let search = ScriptedSearch::new([
            Ok(SearchPage::new(places("a", 1..=20), Some("t1".into()))),
            Err(token_not_ready()),
            Err(token_not_ready()),
            Err(token_not_ready()),
        ]);

        let err = PagedFetcher::new(&search, &Unthrottled, "restaurant")
            .fetch(&square)
            .expect_err("cursor stays invalid");

        assert_eq!(err, token_not_ready());
        assert_eq!(search.request_count(), 4);
    }

    #[rstest]
    fn invalid_first_request_is_not_retried(square: GeoSquare) {
        let search = ScriptedSearch::new([Err(token_not_ready())]);
        let limiter = CountingLimiter::default();

        let err = PagedFetcher::new(&search, &limiter, "restaurant")
            .fetch(&square)
            .expect_err("bad first request");

        assert_eq!(err, token_not_ready());
        assert_eq!(limiter.acquired(), 0);
    }
}

//! Deterministic test doubles for the search, pacing and export seams.
//!
//! None of these make network calls. [`ScriptedSearch`] replays a fixed
//! sequence of responses; [`PlacedSearch`] answers queries from places with
//! known coordinates, enforcing a result cap the way the real API does.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::f64::consts::SQRT_2;
use std::ops::RangeInclusive;

use geo::{Coord, Intersects};

use crate::{
    DegreesPerMile, GeoSquare, METERS_PER_MILE, Place, PlaceSearch, RateLimiter, ResultSet,
    ResultSink, SearchError, SearchPage, SearchRequest,
};

/// Places with identifiers `{prefix}{n}` for each `n` in `range`.
#[must_use]
pub fn places(prefix: &str, range: RangeInclusive<u32>) -> Vec<Place> {
    range
        .map(|n| Place::with_id(format!("{prefix}{n}")))
        .collect()
}

/// `PlaceSearch` replaying scripted responses in order.
///
/// Requests beyond the script fail with [`SearchError::Malformed`].
#[derive(Debug, Default)]
pub struct ScriptedSearch {
    responses: RefCell<VecDeque<Result<SearchPage, SearchError>>>,
    requests: RefCell<Vec<SearchRequest>>,
}

impl ScriptedSearch {
    /// Create a search replaying `responses`.
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<SearchPage, SearchError>>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.borrow().clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl PlaceSearch for ScriptedSearch {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(SearchError::Malformed {
                    message: "scripted search has no more responses".to_owned(),
                })
            })
    }
}

/// `PlaceSearch` over places at fixed coordinates.
///
/// A nearby query is mapped back to the square whose circumscribed circle it
/// describes, and every place inside that square (edges included) matches.
/// At most `cap` matches are reported, in identifier order, split into pages
/// of `page_size`.
#[derive(Debug)]
pub struct PlacedSearch {
    places: Vec<(Coord<f64>, Place)>,
    degrees: DegreesPerMile,
    cap: usize,
    page_size: usize,
    pending: RefCell<Vec<Vec<Place>>>,
    nearby: RefCell<Vec<String>>,
    requests: Cell<usize>,
}

impl PlacedSearch {
    /// Create a search over `places` with the API's reference cap of 60 in
    /// pages of 20.
    pub fn new<I>(places: I, degrees: DegreesPerMile) -> Self
    where
        I: IntoIterator<Item = (Coord<f64>, Place)>,
    {
        Self {
            places: places.into_iter().collect(),
            degrees,
            cap: 60,
            page_size: 20,
            pending: RefCell::new(Vec::new()),
            nearby: RefCell::new(Vec::new()),
            requests: Cell::new(0),
        }
    }

    /// Override the result cap.
    #[must_use]
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    /// Locations of every nearby query received, in order.
    #[must_use]
    pub fn nearby_locations(&self) -> Vec<String> {
        self.nearby.borrow().clone()
    }

    /// Total page requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    fn matching(&self, location: &str, radius_meters: f64) -> Result<ResultSet, SearchError> {
        let malformed = || SearchError::Malformed {
            message: format!("unparseable location {location:?}"),
        };
        let (lat, lon) = location.split_once(',').ok_or_else(malformed)?;
        let lat: f64 = lat.parse().map_err(|_| malformed())?;
        let lon: f64 = lon.parse().map_err(|_| malformed())?;
        let side = radius_meters / METERS_PER_MILE / SQRT_2 * 2.0;
        let square = GeoSquare::new(lat, lon, side).map_err(|err| SearchError::Malformed {
            message: err.to_string(),
        })?;
        let bounds = square.bounds(&self.degrees);
        Ok(self
            .places
            .iter()
            .filter(|(at, _)| bounds.intersects(at))
            .map(|(_, place)| place.clone())
            .collect())
    }

    fn paginate(&self, matches: ResultSet) -> SearchPage {
        let mut capped: Vec<Place> = matches.into_iter().take(self.cap).collect();
        let rest = capped.split_off(self.page_size.min(capped.len()));
        self.page_out(capped, rest)
    }

    fn page_out(&self, page: Vec<Place>, mut rest: Vec<Place>) -> SearchPage {
        if rest.is_empty() {
            return SearchPage::last(page);
        }
        let mut pending = self.pending.borrow_mut();
        let token = pending.len().to_string();
        let tail = rest.split_off(self.page_size.min(rest.len()));
        pending.push(rest);
        pending.push(tail);
        SearchPage::new(page, Some(token))
    }

    fn follow(&self, token: &str) -> Result<SearchPage, SearchError> {
        let unknown = || SearchError::Malformed {
            message: format!("unknown page token {token:?}"),
        };
        let index: usize = token.parse().map_err(|_| unknown())?;
        let (page, rest) = {
            let pending = self.pending.borrow();
            let page = pending.get(index).cloned().ok_or_else(unknown)?;
            let rest = pending.get(index + 1).cloned().ok_or_else(unknown)?;
            (page, rest)
        };
        Ok(self.page_out(page, rest))
    }
}

impl PlaceSearch for PlacedSearch {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        self.requests.set(self.requests.get() + 1);
        match request {
            SearchRequest::Nearby {
                location,
                radius_meters,
                ..
            } => {
                self.nearby.borrow_mut().push(location.clone());
                let matches = self.matching(location, *radius_meters)?;
                Ok(self.paginate(matches))
            }
            SearchRequest::NextPage { token } => self.follow(token),
        }
    }
}

/// `RateLimiter` that counts acquisitions without waiting.
#[derive(Debug, Default)]
pub struct CountingLimiter {
    acquired: Cell<usize>,
}

impl CountingLimiter {
    /// Number of permits acquired so far.
    #[must_use]
    pub fn acquired(&self) -> usize {
        self.acquired.get()
    }
}

impl RateLimiter for CountingLimiter {
    fn acquire(&self) {
        self.acquired.set(self.acquired.get() + 1);
    }
}

/// `ResultSink` keeping the last exported set in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    exported: RefCell<Option<ResultSet>>,
}

impl MemorySink {
    /// The most recently exported set, if any.
    #[must_use]
    pub fn exported(&self) -> Option<ResultSet> {
        self.exported.borrow().clone()
    }
}

impl ResultSink for MemorySink {
    type Error = Infallible;

    fn export(&self, places: &ResultSet) -> Result<(), Self::Error> {
        *self.exported.borrow_mut() = Some(places.clone());
        Ok(())
    }
}

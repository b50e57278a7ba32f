use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::error::SubmitError;
use crate::schools;
use crate::session::{Session, UserProfile};
use crate::submission::FormCollector;
use crate::transport::{SubmissionResult, Submitter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Form,
}

/// Drives one survey form: sign-in state, page, and the submit flow.
pub struct SurveyForm {
    session: RwLock<Session>,
    page: Mutex<Page>,
    collector: FormCollector,
    submitter: Arc<dyn Submitter>,
    in_flight: AtomicBool,
}

/// Held while a submission is in flight; plays the part of the disabled
/// submit button.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SurveyForm {
    pub fn new(collector: FormCollector, submitter: Arc<dyn Submitter>) -> Self {
        Self {
            session: RwLock::new(Session::new()),
            page: Mutex::new(Page::Home),
            collector,
            submitter,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Sign-in callback from the identity provider.
    pub fn sign_in(&self, credential: &str) -> Result<UserProfile, SubmitError> {
        let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
        session.sign_in(credential).cloned()
    }

    pub fn sign_out(&self) {
        self.session
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .sign_out();
        self.show(Page::Home);
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .current()
            .cloned()
    }

    pub fn page(&self) -> Page {
        *self.page_lock()
    }

    pub fn start_survey(&self) -> Result<(), SubmitError> {
        self.require_user()?;
        self.show(Page::Form);
        Ok(())
    }

    pub fn back_to_home(&self) {
        self.show(Page::Home);
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn school_options(&self, city: &str) -> Vec<&'static str> {
        schools::school_options(city)
    }

    /// Collect the form entries and send them.
    ///
    /// Only one submission may be in flight per form; a second call while one
    /// is pending fails with `Busy` without touching the network. On success
    /// the form goes back to the home page.
    pub async fn submit<I, K, V>(&self, entries: I) -> Result<SubmissionResult, SubmitError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let user = self.require_user()?;
        let _guard = InFlight::acquire(&self.in_flight).ok_or(SubmitError::Busy)?;

        let record = self.collector.collect(entries, Some(user.email.as_str()));
        tracing::debug!("Collected record: {record:?}");

        match self.submitter.submit(&record).await {
            Ok(result) => {
                tracing::info!("Survey submitted for {}", user.email);
                self.show(Page::Home);
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Survey submission failed: {e}");
                Err(e)
            }
        }
    }

    fn require_user(&self) -> Result<UserProfile, SubmitError> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .require_user()
            .cloned()
    }

    fn show(&self, page: Page) {
        *self.page_lock() = page;
    }

    fn page_lock(&self) -> MutexGuard<'_, Page> {
        self.page.lock().unwrap_or_else(|e| e.into_inner())
    }
}

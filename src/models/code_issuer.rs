//! Confirmation code issuance
//!
//! A confirmation code is a 10-character token over `A-Z a-z 0-9`. The
//! issuer generates candidates, asks storage whether a candidate is already
//! taken and regenerates until it finds a free one. Absence is only
//! guaranteed at check time: two issuers that check before either persists
//! can both accept the same code. Closing that window needs a storage-level
//! UNIQUE constraint (see `UsersConfig::unique_code_constraint`).

use std::future::Future;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::Result;
use crate::utils::random::{self, ALPHANUMERIC};

/// Length of every confirmation code
pub const CODE_LENGTH: usize = 10;

/// Source of candidate confirmation codes.
///
/// Implementations are pure generators that don't interact with storage.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<G: CodeGenerator + ?Sized> CodeGenerator for Box<G> {
    fn generate(&self) -> String {
        (**self).generate()
    }
}

/// Draws each character independently and uniformly from [`ALPHANUMERIC`]
pub struct RandomCodeGenerator<R = StdRng> {
    rng: Mutex<R>,
}

impl RandomCodeGenerator<StdRng> {
    /// Entropy-seeded generator
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator for reproducible sequences
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for RandomCodeGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + Send> RandomCodeGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl<R: RngCore + Send> CodeGenerator for RandomCodeGenerator<R> {
    fn generate(&self) -> String {
        // A poisoned lock still holds a usable RNG
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        random::string_with_charset(&mut *rng, CODE_LENGTH, ALPHANUMERIC)
    }
}

/// Generate / check / retry loop over an injected [`CodeGenerator`]
pub struct UniqueCodeIssuer<G = RandomCodeGenerator> {
    generator: G,
}

impl Default for UniqueCodeIssuer<RandomCodeGenerator> {
    fn default() -> Self {
        Self::new(RandomCodeGenerator::new())
    }
}

impl<G: CodeGenerator> UniqueCodeIssuer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// One candidate code. No storage access.
    pub fn generate_candidate(&self) -> String {
        self.generator.generate()
    }

    /// Generate candidates until `lookup` reports one as unused.
    ///
    /// `lookup` receives each candidate and returns `Some(_)` when a stored
    /// record already holds it. There is no attempt cap. Lookup errors are
    /// returned unchanged.
    pub async fn issue_unique_code<F, Fut, T>(&self, mut lookup: F) -> Result<String>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            let candidate = self.generate_candidate();

            match lookup(candidate.clone()).await? {
                Some(_) => {
                    log::debug!(
                        "Confirmation code collision on attempt {}, regenerating",
                        attempts
                    );
                }
                None => {
                    log::trace!("Confirmation code accepted after {} attempt(s)", attempts);
                    return Ok(candidate);
                }
            }
        }
    }

    /// Replace the code of record `id`, but only if it still holds
    /// `previous_code`.
    ///
    /// A fresh code is issued through [`Self::issue_unique_code`], then
    /// `update(id, previous_code, new_code)` performs the conditional write.
    /// Returns whatever `update` reports: `false` means the record was
    /// missing or its code had already changed.
    pub async fn reissue_code<L, LFut, T, U, UFut>(
        &self,
        id: i64,
        previous_code: &str,
        lookup: L,
        mut update: U,
    ) -> Result<bool>
    where
        L: FnMut(String) -> LFut,
        LFut: Future<Output = Result<Option<T>>>,
        U: FnMut(i64, String, String) -> UFut,
        UFut: Future<Output = Result<bool>>,
    {
        let code = self.issue_unique_code(lookup).await?;
        update(id, previous_code.to_string(), code).await
    }
}

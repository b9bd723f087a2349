//! Session-code generation.
//!
//! Codes are random alphanumeric strings. Generation retries until the
//! repository confirms the code is unused; the final uniqueness guarantee
//! is the store's unique constraint at create time (a concurrent creator
//! losing the race gets a conflict and the caller regenerates).

use tracing::debug;

use tally_core::session::Session;

use crate::error::StoreError;
use crate::repository::Repository;

/// Generate a code of `length` characters that does not yet exist in the
/// repository.
pub fn generate_unique_code(
    repo: &dyn Repository,
    length: usize,
) -> Result<String, StoreError> {
    let mut attempts = 0u32;
    loop {
        let code = Session::new_code(length);
        if !repo.session_exists(&code)? {
            if attempts > 0 {
                debug!(attempts, "session code collided before success");
            }
            return Ok(code);
        }
        attempts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRepository;
    use tally_core::ids::UserId;
    use tally_core::user::User;

    #[test]
    fn generated_code_has_length_and_charset() {
        let repo = MemoryRepository::new();
        let code = generate_unique_code(&repo, 10).unwrap();
        assert_eq!(code.len(), 10);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_code_not_in_repository() {
        let repo = MemoryRepository::new();
        let author = User::new(UserId::new(), "m", "M");
        // Seed a few sessions, then verify a fresh code never collides.
        for _ in 0..5 {
            let code = generate_unique_code(&repo, 10).unwrap();
            assert!(!repo.session_exists(&code).unwrap());
            let _ = repo
                .create_session(&code, "S", "", "1h", &author)
                .unwrap();
        }
    }

    #[test]
    fn retries_past_occupied_codes() {
        // With length 1 the space is small enough that collisions happen;
        // fill most of it and check generation still lands on a free code.
        let repo = MemoryRepository::new();
        let author = User::new(UserId::new(), "m", "M");
        let mut taken = std::collections::HashSet::new();
        while taken.len() < 50 {
            let code = generate_unique_code(&repo, 1).unwrap();
            assert!(taken.insert(code.clone()), "duplicate code {code}");
            let _ = repo
                .create_session(&code, "S", "", "1h", &author)
                .unwrap();
        }
    }
}

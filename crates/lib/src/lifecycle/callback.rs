use tracing::{debug, warn};

use crate::engine::StepInfo;
use crate::step::Step;

/// Post-step callback for the prime step.
///
/// Checks that the prime directory the part populated is reachable and never
/// modifies it, so it always returns `false`.
///
/// # Panics
///
/// When called for any step other than prime, which means it was registered
/// for the wrong step.
pub fn post_prime(info: &StepInfo) -> bool {
  assert_eq!(
    info.step,
    Step::Prime,
    "post-prime callback invoked for the {} step",
    info.step
  );

  if info.prime_dir.is_dir() {
    debug!(part = %info.part_name, prime_dir = %info.prime_dir.display(), "part primed");
  } else {
    warn!(part = %info.part_name, prime_dir = %info.prime_dir.display(), "prime directory is missing");
  }
  false
}

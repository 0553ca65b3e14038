//! Correlation tokens for outbound requests.
//!
//! Tokens look like `req_<wall clock millis>_<7 base36 chars>`, unique per call
//! within a session.

use minichat_proto::RequestId;

use crate::Environment;

const SUFFIX_LEN: usize = 7;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Fresh correlation token: `req_<wall millis>_<7 base36 chars>`.
///
/// Unique per call within a session as long as the environment's RNG is not
/// degenerate; the timestamp keeps tokens readable in host logs.
pub fn next_request_id<E: Environment>(env: &E) -> RequestId {
    let millis = env.wall_clock_millis();
    let mut bits = env.random_u64();

    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        let digit = (bits % 36) as usize;
        suffix.push(char::from(ALPHABET[digit]));
        bits /= 36;
    }

    RequestId::new(format!("req_{millis}_{suffix}"))
}

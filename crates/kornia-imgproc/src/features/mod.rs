//! Feature detection, description and matching.
//!
//! - **FAST**: segment test corners with non-maximum suppression
//! - **ORB**: oriented FAST keypoints on a scale pyramid with rotated BRIEF descriptors
//! - **Matching**: brute-force Hamming matching with cross-check

mod fast;
pub use fast::*;

mod matching;
pub use matching::*;

mod orb;
pub use orb::*;

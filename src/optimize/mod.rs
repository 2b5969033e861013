// Components F/G: compile-time and match-time optimizers. Split into two
// passes the way the source distinguishes "virtualization time" rewrites
// (structural, run once, baked into the IR) from runtime shortcuts
// (per-match, data-dependent, computed in `matcher.rs` itself).

pub mod static_opt;
pub mod runtime_opt;

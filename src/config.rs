// Process-wide dialect flags, read-only for the lifetime of a `Regex`.
//
// The source keeps these as free-standing globals set by the host before
// constructing a `Regex`; here they are bundled into one immutable value
// threaded through `Regex::new` and down into the matcher, per the design
// note "Explicit global configuration."

/// How aggressively the static and runtime optimizers rewrite the pattern
/// and short-circuit repetitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptimizationLevel {
    /// Disables both the static and runtime optimizers. Every match runs
    /// the literal backtracking interpreter, including length-arithmetic
    /// shortcuts that would otherwise be computed in closed form.
    Off,
    /// Enables the runtime optimizer's end-anchored-tail and
    /// backref-subtract-tail shortcuts only.
    Basic,
    /// Enables every static and runtime optimization, including primality
    /// and power-of-two predicates and the recursive anchor jump.
    Full,
}

impl OptimizationLevel {
    pub fn allows_static(self) -> bool {
        self >= OptimizationLevel::Full
    }

    pub fn allows_runtime_basic(self) -> bool {
        self >= OptimizationLevel::Basic
    }

    pub fn allows_runtime_full(self) -> bool {
        self >= OptimizationLevel::Full
    }
}

/// Verbosity of the `log` tracing emitted by the matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugTrace {
    Off,
    /// Logs group enter/exit and verb firing at `debug!`.
    Groups,
    /// Additionally logs every symbol dispatch and backtrack at `trace!`.
    Symbols,
}

impl DebugTrace {
    pub fn logs_groups(self) -> bool {
        self >= DebugTrace::Groups
    }

    pub fn logs_symbols(self) -> bool {
        self >= DebugTrace::Symbols
    }
}

/// Process-wide dialect configuration, per spec §6.
#[derive(Clone, Debug)]
pub struct Config {
    pub free_spacing_mode: bool,
    pub emulate_ecma_npcgs: bool,
    pub allow_empty_character_classes: bool,
    pub no_empty_optional: bool,
    pub allow_quantifiers_on_assertions: bool,
    pub allow_molecular_lookaround: bool,
    pub allow_lookinto: bool,
    pub allow_atomic_groups: bool,
    pub allow_branch_reset_groups: bool,
    pub allow_possessive_quantifiers: bool,
    pub allow_conditionals: bool,
    pub allow_lookaround_conditionals: bool,
    pub allow_reset_start: bool,
    pub enable_persistent_backrefs: bool,
    pub enable_verbs: bool,
    pub optimization_level: OptimizationLevel,
    pub debug_trace: DebugTrace,
}

impl Default for Config {
    /// The engine's "native" dialect: every extension on, optimizer at
    /// full strength, no tracing.
    fn default() -> Config {
        Config {
            free_spacing_mode: false,
            emulate_ecma_npcgs: false,
            allow_empty_character_classes: false,
            no_empty_optional: false,
            allow_quantifiers_on_assertions: true,
            allow_molecular_lookaround: true,
            allow_lookinto: true,
            allow_atomic_groups: true,
            allow_branch_reset_groups: true,
            allow_possessive_quantifiers: true,
            allow_conditionals: true,
            allow_lookaround_conditionals: true,
            allow_reset_start: true,
            enable_persistent_backrefs: true,
            enable_verbs: true,
            optimization_level: OptimizationLevel::Full,
            debug_trace: DebugTrace::Off,
        }
    }
}

impl Config {
    /// The `--pcre` preset: restrict the dialect to constructs PCRE 8.x
    /// itself supports, with ECMA NPCG emulation off (PCRE's own NPCG
    /// semantics, not ECMAScript's).
    pub fn pcre() -> Config {
        Config {
            free_spacing_mode: false,
            emulate_ecma_npcgs: false,
            allow_empty_character_classes: false,
            no_empty_optional: false,
            allow_quantifiers_on_assertions: false,
            allow_molecular_lookaround: false,
            allow_lookinto: false,
            allow_atomic_groups: true,
            allow_branch_reset_groups: true,
            allow_possessive_quantifiers: true,
            allow_conditionals: true,
            allow_lookaround_conditionals: true,
            allow_reset_start: true,
            enable_persistent_backrefs: false,
            enable_verbs: true,
            optimization_level: OptimizationLevel::Full,
            debug_trace: DebugTrace::Off,
        }
    }
}

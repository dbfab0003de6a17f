//! Per-standard feature gating: each named C feature is enabled from
//! the C edition it was introduced in onward. Using a feature in an
//! incompatible mode is a warning for an extension (GNU statement
//! expressions, labels-as-values, case ranges, `typeof`) or an error for a
//! genuinely unsupported construct — the parser decides which per call site
//! via [`Feature::is_extension`].

use mcc_common::CStd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Bool,
    Restrict,
    Vla,
    DesignatedInitializers,
    FlexibleArrays,
    StaticAssert,
    Generic,
    Alignof,
    Noreturn,
    Atomic,
    ThreadLocal,
    AnonymousAggregates,
    Nullptr,
    Constexpr,
    Typeof,
    BoolKeyword,
    Attributes,
    StatementExpressions,
    LabelsAsValues,
    CaseRanges,
}

impl Feature {
    /// The C standard a conforming front end first accepts this feature in.
    /// GNU/common extensions (`Typeof`, `StatementExpressions`,
    /// `LabelsAsValues`, `CaseRanges`) are accepted from C89 onward but
    /// flagged, never hard-errored — see [`Feature::is_extension`].
    pub fn min_std(self) -> CStd {
        match self {
            Feature::Bool
            | Feature::Restrict
            | Feature::Vla
            | Feature::DesignatedInitializers
            | Feature::FlexibleArrays => CStd::C99,
            Feature::StaticAssert
            | Feature::Generic
            | Feature::Alignof
            | Feature::Noreturn
            | Feature::Atomic
            | Feature::ThreadLocal
            | Feature::AnonymousAggregates => CStd::C11,
            Feature::Nullptr | Feature::Constexpr | Feature::BoolKeyword | Feature::Attributes => {
                CStd::C23
            }
            Feature::Typeof => CStd::C23,
            Feature::StatementExpressions | Feature::LabelsAsValues | Feature::CaseRanges => {
                CStd::C89
            }
        }
    }

    /// Whether using this feature before its minimum standard is merely a
    /// permissive-mode warning (GNU/common extensions) rather than a hard
    /// parse error.
    pub fn is_extension(self) -> bool {
        matches!(
            self,
            Feature::Typeof
                | Feature::StatementExpressions
                | Feature::LabelsAsValues
                | Feature::CaseRanges
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Feature::Bool => "_Bool",
            Feature::Restrict => "restrict",
            Feature::Vla => "variable-length array",
            Feature::DesignatedInitializers => "designated initializer",
            Feature::FlexibleArrays => "flexible array member",
            Feature::StaticAssert => "_Static_assert",
            Feature::Generic => "_Generic",
            Feature::Alignof => "_Alignof",
            Feature::Noreturn => "_Noreturn",
            Feature::Atomic => "_Atomic",
            Feature::ThreadLocal => "_Thread_local",
            Feature::AnonymousAggregates => "anonymous struct/union member",
            Feature::Nullptr => "nullptr",
            Feature::Constexpr => "constexpr",
            Feature::Typeof => "typeof",
            Feature::BoolKeyword => "bool as a keyword",
            Feature::Attributes => "[[attribute]]",
            Feature::StatementExpressions => "statement expression",
            Feature::LabelsAsValues => "label address",
            Feature::CaseRanges => "case range",
        }
    }
}

/// Checks whether `feature` is available under `std` — each
/// C-standard feature is gated by a feature flag.
pub fn is_enabled(std: CStd, feature: Feature) -> bool {
    std.at_least(feature.min_std())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_requires_c99() {
        assert!(!is_enabled(CStd::C89, Feature::Bool));
        assert!(is_enabled(CStd::C99, Feature::Bool));
    }

    #[test]
    fn extension_features_are_flagged_not_errored() {
        assert!(Feature::StatementExpressions.is_extension());
        assert!(!Feature::Generic.is_extension());
    }
}

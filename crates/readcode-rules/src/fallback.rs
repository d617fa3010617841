use readcode_model::{Code, Coding, FallbackPolicy};

/// Resolve unset codings according to `policy`. Returns how many records
/// were unset before the policy ran.
pub fn apply_fallback(codings: &mut [Coding], policy: FallbackPolicy) -> usize {
    let mut unmatched = 0usize;
    for coding in codings.iter_mut().filter(|coding| coding.is_unset()) {
        unmatched += 1;
        if policy == FallbackPolicy::ZeroFill {
            *coding = Coding::Coded(Code::ZERO);
        }
    }
    unmatched
}

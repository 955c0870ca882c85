//! Stable integer codes for the built-in function families.
//!
//! | family                         | codes                                              |
//! |--------------------------------|----------------------------------------------------|
//! | activation / its Jacobian      | 0 identity, 1 sigmoid, 2 tanh, 3 relu, 4 softmax   |
//! | loss / its gradient            | 1 squared error, 2 cross-entropy                   |
//! | pool reducer / its distributor | 1 max, 2 average                                   |
//!
//! Codes are part of the persisted model format and must never be reassigned.

use crate::activation::Activation;
use crate::error::{NnetError, Result};
use crate::loss::Loss;
use crate::pool::PoolFunction;

/// A closed enumeration that can be written to and read back from a model file.
pub trait FunctionCode: Sized + Copy + 'static {
    /// Family name used in error messages.
    const FAMILY: &'static str;
    /// Every member of the family.
    const MEMBERS: &'static [Self];

    fn code(self) -> u32;

    fn from_code(code: u32) -> Result<Self> {
        Self::MEMBERS
            .iter()
            .copied()
            .find(|member| member.code() == code)
            .ok_or_else(|| NnetError::format(format!("unknown {} code {}", Self::FAMILY, code)))
    }
}

impl FunctionCode for Activation {
    const FAMILY: &'static str = "activation";
    const MEMBERS: &'static [Self] = &Activation::ALL;

    fn code(self) -> u32 {
        self as u32
    }
}

impl FunctionCode for Loss {
    const FAMILY: &'static str = "loss";
    const MEMBERS: &'static [Self] = &Loss::ALL;

    fn code(self) -> u32 {
        self as u32
    }
}

impl FunctionCode for PoolFunction {
    const FAMILY: &'static str = "pool";
    const MEMBERS: &'static [Self] = &PoolFunction::ALL;

    fn code(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bijective<T: FunctionCode + PartialEq + std::fmt::Debug>() {
        for &member in T::MEMBERS {
            assert_eq!(T::from_code(member.code()).unwrap(), member);
        }
        let mut codes: Vec<u32> = T::MEMBERS.iter().map(|m| m.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), T::MEMBERS.len());
    }

    #[test]
    fn every_family_is_bijective() {
        assert_bijective::<Activation>();
        assert_bijective::<Loss>();
        assert_bijective::<PoolFunction>();
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(Activation::Identity.code(), 0);
        assert_eq!(Activation::Softmax.code(), 4);
        assert_eq!(Loss::SquaredError.code(), 1);
        assert_eq!(Loss::CrossEntropy.code(), 2);
        assert_eq!(PoolFunction::Max.code(), 1);
        assert_eq!(PoolFunction::Average.code(), 2);
    }

    #[test]
    fn unknown_codes_are_format_errors() {
        assert!(matches!(Activation::from_code(5), Err(NnetError::Format(_))));
        assert!(matches!(Loss::from_code(0), Err(NnetError::Format(_))));
        assert!(matches!(PoolFunction::from_code(3), Err(NnetError::Format(_))));
    }
}

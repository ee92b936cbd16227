/// Standard function registry
///
/// Infers the result type of a function call that does not state one.
use std::collections::HashMap;

use crate::domain_metamodel::types::{BasicType, DomainType, JavaType};

/// How a function's result type is derived
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnTypeRule {
    /// Same type as the first argument
    FirstArgument,
    Fixed(JavaType),
    /// Integral sums widen to long, floating sums to double
    SumPromotion,
}

#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: &'static str,
    pub return_type: ReturnTypeRule,
}

/// Get the descriptor of a standard function (case-insensitive)
pub fn get_function_descriptor(name: &str) -> Option<FunctionDescriptor> {
    let name_lower = name.to_lowercase();
    STANDARD_FUNCTIONS.get(name_lower.as_str()).cloned()
}

/// Result type of `name` applied to arguments of `argument_types`.
///
/// Unknown functions, and first-argument functions called without a typed
/// first argument, are untyped.
pub fn infer_return_type(name: &str, argument_types: &[Option<DomainType>]) -> Option<DomainType> {
    let descriptor = get_function_descriptor(name)?;
    match descriptor.return_type {
        ReturnTypeRule::FirstArgument => argument_types.first().cloned().flatten(),
        ReturnTypeRule::Fixed(java_type) => Some(DomainType::Basic(BasicType::standard(java_type))),
        ReturnTypeRule::SumPromotion => {
            let argument = argument_types.first().cloned().flatten()?;
            let Some(basic) = argument.as_basic() else {
                return Some(argument);
            };
            let promoted = match basic.java_type {
                JavaType::Byte | JavaType::Short | JavaType::Integer | JavaType::Long => {
                    BasicType::long()
                }
                JavaType::Float | JavaType::Double => BasicType::double(),
                _ => basic.clone(),
            };
            Some(DomainType::Basic(promoted))
        }
    }
}

lazy_static::lazy_static! {
    static ref STANDARD_FUNCTIONS: HashMap<&'static str, FunctionDescriptor> = {
        let mut m = HashMap::new();

        for name in ["upper", "lower", "trim", "abs", "min", "max", "coalesce"] {
            m.insert(name, FunctionDescriptor {
                name,
                return_type: ReturnTypeRule::FirstArgument,
            });
        }

        // ===== FIXED RESULT TYPES =====
        let fixed = [
            ("length", JavaType::Integer),
            ("locate", JavaType::Integer),
            ("size", JavaType::Integer),
            ("mod", JavaType::Integer),
            ("count", JavaType::Long),
            ("avg", JavaType::Double),
            ("sqrt", JavaType::Double),
            ("concat", JavaType::String),
            ("substring", JavaType::String),
            ("current_date", JavaType::Date),
            ("current_time", JavaType::Time),
            ("current_timestamp", JavaType::Timestamp),
        ];
        for (name, java_type) in fixed {
            m.insert(name, FunctionDescriptor {
                name,
                return_type: ReturnTypeRule::Fixed(java_type),
            });
        }

        m.insert("sum", FunctionDescriptor {
            name: "sum",
            return_type: ReturnTypeRule::SumPromotion,
        });

        m
    };
}

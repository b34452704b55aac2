// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::OperationRegistry;
use crate::operations::traits::OperationError;

#[test]
fn test_registry_loads_builtin_operations() {
    let registry = OperationRegistry::load();

    assert_eq!(registry.names(), vec!["divide", "multiply", "subtract", "sum"]);
    assert!(registry.contains("sum"));
    assert!(!registry.contains("modulo"));
}

#[test]
fn test_registry_matches_schema_constraint() {
    let registry = OperationRegistry::load();

    assert_eq!(registry.names(), migration::CONSTRAINED_OPERATIONS.to_vec());
}

#[test]
fn test_operations_compute() {
    let registry = OperationRegistry::load();

    assert_eq!(registry.get("sum").unwrap().apply(2, 3), Ok(5));
    assert_eq!(registry.get("subtract").unwrap().apply(2, 3), Ok(-1));
    assert_eq!(registry.get("multiply").unwrap().apply(7, 6), Ok(42));
    assert_eq!(registry.get("divide").unwrap().apply(9, 2), Ok(4));
}

#[test]
fn test_divide_by_zero_is_an_error() {
    let registry = OperationRegistry::load();

    assert_eq!(
        registry.get("divide").unwrap().apply(1, 0),
        Err(OperationError::DivisionByZero)
    );
}

#[test]
fn test_multiply_overflow_is_an_error() {
    let registry = OperationRegistry::load();

    assert_eq!(
        registry.get("multiply").unwrap().apply(i64::MAX, 2),
        Err(OperationError::Overflow)
    );
}

//! One metamodel shared by concurrent lowering passes

use std::sync::Arc;
use std::thread;

use sqm_lowering::lower;
use sqm_lowering::sqm::{Expression, Predicate, SelectClause};

use super::common::*;

#[test]
fn test_concurrent_passes_share_a_read_only_metamodel() {
    let metamodel = Arc::new(shop_metamodel());
    let statement = Arc::new(select(
        select_from("Leaf", "l")
            .with_select(SelectClause::of(vec![Expression::path("l.color")]))
            .with_where(Predicate::eq(
                Expression::path("l.description"),
                Expression::named_parameter("d"),
            )),
    ));
    let expected = lower(&statement, &metamodel).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let metamodel = Arc::clone(&metamodel);
            let statement = Arc::clone(&statement);
            thread::spawn(move || lower(&statement, &metamodel).unwrap())
        })
        .collect();

    for handle in handles {
        let lowered = handle.join().unwrap();
        assert_eq!(lowered, expected);
    }
}

//! Example test binary
//!
//! Run with:
//!   cargo run -p ouroboros-qc --example math_suite
//!   cargo run -p ouroboros-qc --example math_suite -- --fail-fast --format junit

use ouroboros_qc::{
    assert_that, cli, dump_and_compare, expect, qc_assert, AssertionResult, ClassRegistry,
    OperationResult, Runner, UnitTest, UnitTestClass,
};
use std::process::ExitCode;

#[derive(Default)]
struct Inventory {
    items: Vec<(String, u32)>,
}

impl Inventory {
    fn load(&mut self) -> bool {
        self.items = vec![("bolt".to_string(), 40), ("nut".to_string(), 25)];
        !self.items.is_empty()
    }

    fn total(&mut self) -> AssertionResult {
        let total: u32 = self.items.iter().map(|(_, qty)| qty).sum();
        expect(total).to_equal(&65)
    }

    fn restock(&mut self) -> OperationResult {
        match self.items.iter_mut().find(|(name, _)| name == "nut") {
            Some(item) => {
                item.1 += 10;
                OperationResult::success()
            }
            None => OperationResult::failure("nut is not stocked"),
        }
    }

    fn render(&mut self) -> AssertionResult {
        let csv = self
            .items
            .iter()
            .map(|(name, qty)| format!("{}={}", name, qty))
            .collect::<Vec<_>>()
            .join(",");
        dump_and_compare(&csv, "bolt=40,nut=35", "inventory rendering changed")
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

impl UnitTestClass for Inventory {
    const NAME: &'static str = "Inventory";
    const CONTINUE_ON_FAIL: bool = true;

    fn register(registry: &mut ClassRegistry<Self>) {
        registry
            .init(Inventory::load)
            .cleanup(Inventory::clear)
            .case("total", Inventory::total)
            .case("restock", Inventory::restock)
            .case("render", Inventory::render);
    }
}

fn checked_div(a: i32, b: i32) -> anyhow::Result<()> {
    qc_assert!(b != 0, "division by zero");
    let _ = a / b;
    Ok(())
}

fn main() -> ExitCode {
    let mut runner = Runner::new();

    let math = UnitTest::builder("Math")
        .continue_on_failure(true)
        .case("add ok", || 1 + 1 == 2)
        .case("sub ok", || assert_that(5 - 3 == 2, "bad subtraction"))
        .case("div by zero", || checked_div(1, 0))
        .build();

    match math {
        Ok(suite) => runner.add_suite(suite),
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Err(e) = runner.add_class::<Inventory>() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    cli::main_with(runner)
}

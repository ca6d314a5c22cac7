//! Framework de testes do kernel
//!
//! Suites são `&[TestCase]` executadas pelo binário (feature `self_test`)
//! e pelos wrappers `#[test]` de `mm::test`.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Contagem de uma suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuiteReport {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteReport {
    pub fn ok(&self) -> bool {
        self.failed == 0
    }
}

/// Executa suite de testes
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> SuiteReport {
    crate::kinfo!(&format!("=== Executando suite: {}", name));

    let mut report = SuiteReport::default();
    for test in tests {
        match (test.func)() {
            TestResult::Passed => {
                crate::kok!(test.name);
                report.passed += 1;
            }
            TestResult::Failed => {
                crate::kfail!(test.name);
                report.failed += 1;
            }
            TestResult::Skipped => {
                crate::kwarn!(&format!("[SKIP] {}", test.name));
                report.skipped += 1;
            }
        }
    }

    crate::kinfo!("Resultados: passed/failed=", report.passed, report.failed);
    report
}

/// Falha o teste corrente se a condição for falsa
#[macro_export]
macro_rules! ktest_assert {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            $crate::kerror!($msg);
            return $crate::klib::test_framework::TestResult::Failed;
        }
    };
    ($cond:expr, $msg:expr, $($val:expr),+ $(,)?) => {
        if !$cond {
            $crate::kerror!($msg, $($val),+);
            return $crate::klib::test_framework::TestResult::Failed;
        }
    };
}

/// Desembrulha um `Result`, falhando o teste corrente em `Err`
#[macro_export]
macro_rules! ktest_try {
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                $crate::kerror!($msg);
                $crate::kerror!(&format!("{:?}", err));
                return $crate::klib::test_framework::TestResult::Failed;
            }
        }
    };
}

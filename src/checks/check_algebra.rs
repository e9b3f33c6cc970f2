use crate::checks::check_commands::{Expectation, SequenceCmd};
use crate::errors::CheckFailure;
use async_trait::async_trait;

/// State threaded through the steps of one check: setup, body and teardown share it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckContext {
    pub snapshot: Option<String>, // Result from CaptureSnapshot
    pub loads_completed: usize,
}

// The Accumulator type that will be threaded through
pub type StepAccumulator = Result<CheckContext, CheckFailure>;

#[async_trait]
pub trait CheckAlgebra: Send {
    async fn interpret_load_and_wait(
        &mut self,
        index: usize,
        current_acc: StepAccumulator,
    ) -> StepAccumulator;

    async fn interpret_load_detached(
        &mut self,
        index: usize,
        current_acc: StepAccumulator,
    ) -> StepAccumulator;

    async fn interpret_capture_snapshot(&mut self, current_acc: StepAccumulator)
    -> StepAccumulator;

    async fn interpret_toggle_menu(&mut self, current_acc: StepAccumulator) -> StepAccumulator;

    async fn interpret_expect(
        &mut self,
        expectation: &Expectation,
        current_acc: StepAccumulator,
    ) -> StepAccumulator;

    async fn interpret_end(&mut self, final_acc: StepAccumulator) -> StepAccumulator;
}

pub async fn run_steps(
    command: &SequenceCmd,
    initial_accumulator: StepAccumulator,
    algebra: &mut impl CheckAlgebra,
) -> StepAccumulator {
    let mut current_acc = initial_accumulator;
    let mut current_cmd_node = command;

    loop {
        // Algebra methods check current_acc.is_err() and propagate it untouched.
        match current_cmd_node {
            SequenceCmd::LoadAndWait(index, next_cmd) => {
                current_acc = algebra.interpret_load_and_wait(*index, current_acc).await;
                current_cmd_node = next_cmd;
            }
            SequenceCmd::LoadDetached(index, next_cmd) => {
                current_acc = algebra.interpret_load_detached(*index, current_acc).await;
                current_cmd_node = next_cmd;
            }
            SequenceCmd::CaptureSnapshot(next_cmd) => {
                current_acc = algebra.interpret_capture_snapshot(current_acc).await;
                current_cmd_node = next_cmd;
            }
            SequenceCmd::ToggleMenu(next_cmd) => {
                current_acc = algebra.interpret_toggle_menu(current_acc).await;
                current_cmd_node = next_cmd;
            }
            SequenceCmd::Expect(expectation, next_cmd) => {
                current_acc = algebra.interpret_expect(expectation, current_acc).await;
                current_cmd_node = next_cmd;
            }
            SequenceCmd::End => {
                current_acc = algebra.interpret_end(current_acc).await;
                break;
            }
        }
    }
    current_acc
}

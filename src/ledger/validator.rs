use super::{
    action::{Action, Direction},
    error::LedgerError,
};

/// Checks that `actions` is a legal history for one day. The scan goes left to right and stops
/// at the first broken rule:
///  - the day starts with IN,
///  - time never goes backwards,
///  - an IN is followed by an OUT of the same task,
///  - an OUT is never followed by another OUT.
pub fn validate(actions: &[Action]) -> Result<(), LedgerError> {
    let Some((first, rest)) = actions.split_first() else {
        return Ok(());
    };

    if first.direction() != Direction::In {
        return Err(LedgerError::InvalidFirstAction {
            task: first.task().to_string(),
            direction: first.direction(),
        });
    }

    let mut current = first;
    for next in rest {
        if next.time() < current.time() {
            return Err(LedgerError::TimeRegression {
                previous: current.time().time(),
                next: next.time().time(),
            });
        }
        match (current.direction(), next.direction()) {
            (Direction::In, Direction::Out) if next.task() == current.task() => {}
            (Direction::In, direction) => {
                return Err(LedgerError::UnclosedTaskMismatch {
                    open_task: current.task().to_string(),
                    task: next.task().to_string(),
                    direction,
                });
            }
            (Direction::Out, Direction::Out) => {
                return Err(LedgerError::DoubleClose {
                    task: next.task().to_string(),
                    time: next.time().time(),
                });
            }
            (Direction::Out, Direction::In) => {}
        }
        current = next;
    }

    Ok(())
}

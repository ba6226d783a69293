use anyhow::Result;
use inquire::{InquireError, Password, PasswordDisplayMode};

mod progress;
mod style;

pub use progress::BatchProgress;
pub use style::Style;

/// Check if the inquire error is a user cancellation/interruption.
const fn is_prompt_cancelled(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Wraps a function that uses interactive prompts and handles user cancellation gracefully.
///
/// If the user cancels the prompt (Ctrl+C or Escape), this function prints a newline
/// to clean up the terminal and returns `Ok(())` instead of propagating the error.
pub fn handle_prompt_cancellation<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    match f() {
        Ok(()) => Ok(()),
        Err(e)
            if e.downcast_ref::<InquireError>()
                .is_some_and(is_prompt_cancelled) =>
        {
            eprintln!();
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Asks for an API key with masked input.
///
/// Returns `Ok(None)` if the user dismisses the prompt.
pub fn prompt_api_key(provider: &str) -> Result<Option<String>> {
    let answer = Password::new(&format!("API key for {provider}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Set the provider's API key environment variable to skip this prompt")
        .prompt();

    match answer {
        Ok(key) => Ok(Some(key)),
        Err(e) if is_prompt_cancelled(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_prompt_cancellation_ok() {
        let result = handle_prompt_cancellation(|| Ok(()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_handle_prompt_cancellation_operation_canceled() {
        let result = handle_prompt_cancellation(|| Err(InquireError::OperationCanceled.into()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_handle_prompt_cancellation_other_error() {
        let result = handle_prompt_cancellation(|| Err(anyhow::anyhow!("Some other error")));
        let Err(err) = result else {
            panic!("expected an error");
        };
        assert!(err.to_string().contains("Some other error"));
    }

    #[test]
    fn test_is_prompt_cancelled() {
        assert!(is_prompt_cancelled(&InquireError::OperationCanceled));
        assert!(is_prompt_cancelled(&InquireError::OperationInterrupted));
        assert!(!is_prompt_cancelled(&InquireError::Custom("test".into())));
    }

    #[test]
    fn test_hidden_progress_does_not_register() {
        let progress = BatchProgress::new(3, false);
        progress.advance();
        progress.set_message("batch 1");
        drop(progress);
    }
}

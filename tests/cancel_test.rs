#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use crossbeam::channel::{self, RecvTimeoutError};
    use weir::{stage, CancellationToken};

    fn fires_within(token: &CancellationToken, limit: Duration) -> bool {
        matches!(
            token.done().recv_timeout(limit),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    #[test]
    fn or_matches_logical_or() {
        for count in [0usize, 1, 2, 3, 4, 7] {
            for mask in 0u32..(1 << count) {
                let inputs: Vec<_> = (0..count).map(|_| CancellationToken::new()).collect();
                let combined = stage::or(&inputs);
                inputs
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .for_each(|(_, token)| token.cancel());

                if mask == 0 {
                    assert!(
                        !fires_within(&combined, Duration::from_millis(10)),
                        "Or over {count} idle tokens fired"
                    );
                    // Releases the watching stages.
                    combined.cancel();
                } else {
                    assert!(
                        fires_within(&combined, Duration::from_secs(5)),
                        "Or over {count} tokens with mask {mask:#b} never fired"
                    );
                }
            }
        }
    }

    #[test]
    fn or_follows_the_later_input() {
        let a = CancellationToken::new();
        let b = CancellationToken::new();
        let combined = stage::or(&[a.clone(), b.clone()]);

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            b.cancel();
        });
        assert!(fires_within(&combined, Duration::from_secs(5)));
        assert!(!a.is_cancelled());
        canceller.join().unwrap();
    }

    #[test]
    fn or_accepts_signal_and_timeout_tokens() {
        let (signal, rcv) = channel::bounded::<()>(0);
        let from_signal = CancellationToken::from_signal(Some(rcv));
        let root = CancellationToken::new();
        let from_timeout = CancellationToken::with_timeout(&root, Duration::from_secs(60));
        let combined = stage::or(&[from_signal, from_timeout.clone(), root.clone()]);

        assert!(!fires_within(&combined, Duration::from_millis(10)));
        drop(signal);
        assert!(fires_within(&combined, Duration::from_secs(5)));
        // The timeout branch is untouched and still pending.
        assert!(!from_timeout.is_cancelled());
        root.cancel();
        assert!(from_timeout.is_cancelled());
    }

    #[test]
    fn or_done_prefix_after_cancel() {
        for observed in [0usize, 1, 3, 10] {
            let token = CancellationToken::new();
            let output = stage::or_done(&token, stage::repeat(&token, ['a', 'b', 'c']));
            let mut got = vec![];
            if observed == 0 {
                token.cancel();
            }
            for value in output.iter() {
                if got.len() == observed {
                    continue;
                }
                got.push(value);
                if got.len() == observed {
                    token.cancel();
                }
            }
            let expected: Vec<_> = ['a', 'b', 'c'].into_iter().cycle().take(got.len()).collect();
            assert!(got.len() <= observed);
            assert_eq!(got, expected);
        }
    }
}

use crate::errors::VammError;
use crate::tick_bitmap::TickBitmap;

/// Comprehensive tests for tick_bitmap.rs functionalities
mod tick_bitmap_tests {
    use super::*;

    mod flip_tests {
        use super::*;

        #[test]
        fn test_flip_round_trip() {
            let mut bitmap = TickBitmap::new();
            assert!(!bitmap.is_initialized(0, 1));

            bitmap.flip_tick(0, 1).unwrap();
            assert!(bitmap.is_initialized(0, 1));

            bitmap.flip_tick(0, 1).unwrap();
            assert!(!bitmap.is_initialized(0, 1));
        }

        #[test]
        fn test_flip_misaligned_rejected() {
            let mut bitmap = TickBitmap::new();
            assert_eq!(
                bitmap.flip_tick(5, 10),
                Err(VammError::MisalignedTick { tick: 5, spacing: 10 })
            );
            assert_eq!(
                bitmap.flip_tick(-5, 10),
                Err(VammError::MisalignedTick {
                    tick: -5,
                    spacing: 10
                })
            );
        }

        #[test]
        fn test_flip_negative_ticks() {
            let mut bitmap = TickBitmap::new();
            // -1 compresses into word -1 bit 255, not word 0
            bitmap.flip_tick(-1, 1).unwrap();
            assert!(bitmap.is_initialized(-1, 1));
            assert!(!bitmap.is_initialized(0, 1));
            assert!(!bitmap.is_initialized(-2, 1));
        }

        #[test]
        fn test_flip_with_spacing() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(-30, 10).unwrap();
            assert!(bitmap.is_initialized(-30, 10));
            // A different spacing reads a different slot
            assert!(!bitmap.is_initialized(-30, 5));
        }

        #[test]
        fn test_is_initialized_misaligned_is_false() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(20, 10).unwrap();
            assert!(!bitmap.is_initialized(25, 10));
        }

        #[test]
        fn test_distinct_ticks_are_independent() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(100, 1).unwrap();
            bitmap.flip_tick(101, 1).unwrap();
            bitmap.flip_tick(100, 1).unwrap();

            assert!(!bitmap.is_initialized(100, 1));
            assert!(bitmap.is_initialized(101, 1));
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn test_search_up_finds_tick_in_word() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(100, 1).unwrap();

            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(0, 1, false).unwrap();
            assert_eq!(next, 100);
            assert!(initialized);
        }

        #[test]
        fn test_search_up_excludes_current() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(100, 1).unwrap();

            // Searching up from the initialized tick itself must move past it
            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(100, 1, false).unwrap();
            assert_eq!(next, 255, "should report the word-end boundary");
            assert!(!initialized);
        }

        #[test]
        fn test_search_down_includes_current() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(100, 1).unwrap();

            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(100, 1, true).unwrap();
            assert_eq!(next, 100);
            assert!(initialized);
        }

        #[test]
        fn test_search_down_finds_lower_tick() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(50, 1).unwrap();

            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(200, 1, true).unwrap();
            assert_eq!(next, 50);
            assert!(initialized);
        }

        #[test]
        fn test_search_down_word_start_boundary() {
            let bitmap = TickBitmap::new();
            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(49, 1, true).unwrap();
            assert_eq!(next, 0, "empty word reports its start going down");
            assert!(!initialized);
        }

        #[test]
        fn test_search_spans_words_via_boundary() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(-1, 1).unwrap();

            // From tick 0 going down, the first call only scans word 0
            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(0, 1, true).unwrap();
            assert_eq!(next, 0);
            assert!(!initialized);

            // Stepping below the boundary reaches word -1 and finds it
            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(-1, 1, true).unwrap();
            assert_eq!(next, -1);
            assert!(initialized);
        }

        #[test]
        fn test_search_respects_spacing() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(600, 200).unwrap();

            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(0, 200, false).unwrap();
            assert_eq!(next, 600);
            assert!(initialized);

            // Word end for spacing 200 sits at compressed bit 255
            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(600, 200, false).unwrap();
            assert_eq!(next, 255 * 200);
            assert!(!initialized);
        }

        #[test]
        fn test_search_rejects_misaligned_origin() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(200, 200).unwrap();

            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(150, 200, true),
                Err(VammError::MisalignedTick {
                    tick: 150,
                    spacing: 200
                })
            );
            assert_eq!(
                bitmap.next_initialized_tick_within_one_word(-150, 200, false),
                Err(VammError::MisalignedTick {
                    tick: -150,
                    spacing: 200
                })
            );
        }

        #[test]
        fn test_search_up_from_negative_floor_compression() {
            let mut bitmap = TickBitmap::new();
            bitmap.flip_tick(0, 1).unwrap();

            // From -1 searching up, compression must floor so the scan
            // starts at compressed 0 and finds tick 0
            let (next, initialized) = bitmap.next_initialized_tick_within_one_word(-1, 1, false).unwrap();
            assert_eq!(next, 0);
            assert!(initialized);
        }
    }
}

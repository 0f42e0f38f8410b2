//! Property-based tests for byte order handling and save normalization

use n64_save_converter::core::header::{clean_title, TITLE_LENGTH};
use n64_save_converter::core::registry::{CONTROLLER_PAK_CONTAINER_SIZE, CONTROLLER_PAK_SIZE};
use n64_save_converter::core::transform::{normalize, swap_words};
use n64_save_converter::{ByteOrderMode, CartridgeHeader, ConvertError, HEADER_SIZE, SaveKind};
use proptest::prelude::*;

fn header_bytes() -> impl Strategy<Value = [u8; HEADER_SIZE]> {
    prop::collection::vec(any::<u8>(), HEADER_SIZE).prop_map(|v| {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes.copy_from_slice(&v);
        bytes
    })
}

proptest! {
    #[test]
    fn prop_header_normalization_is_involution(bytes in header_bytes()) {
        let header = CartridgeHeader::new(bytes);
        for mode in [ByteOrderMode::Native, ByteOrderMode::WordSwapped, ByteOrderMode::HalfwordSwapped] {
            prop_assert_eq!(header.normalized(mode).normalized(mode), header);
        }
        prop_assert_eq!(header.normalized(ByteOrderMode::Native), header);
    }

    #[test]
    fn prop_swapped_magic_detects_and_restores(mut bytes in header_bytes()) {
        bytes[0..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
        let native = CartridgeHeader::new(bytes);

        for mode in [ByteOrderMode::WordSwapped, ByteOrderMode::HalfwordSwapped] {
            let stored = native.normalized(mode);
            let (detected, canonical) = stored.to_canonical().unwrap();
            prop_assert_eq!(detected, mode);
            prop_assert_eq!(canonical, native);
        }
    }

    #[test]
    fn prop_clean_title_is_sanitized(field in prop::collection::vec(any::<u8>(), TITLE_LENGTH)) {
        let title = clean_title(&field);
        prop_assert!(title.len() <= TITLE_LENGTH);
        prop_assert!(title.chars().all(|c| c.is_ascii_alphanumeric() || c == ' '));
    }

    #[test]
    fn prop_swap_words_round_trip(words in prop::collection::vec(any::<[u8; 4]>(), 0..512)) {
        let original: Vec<u8> = words.concat();
        let mut data = original.clone();
        swap_words(&mut data).unwrap();
        swap_words(&mut data).unwrap();
        prop_assert_eq!(data, original);
    }

    #[test]
    fn prop_swap_words_rejects_misaligned(len in 0usize..2048) {
        prop_assume!(len % 4 != 0);
        let mut data = vec![0u8; len];
        let rejected = matches!(
            swap_words(&mut data),
            Err(ConvertError::MisalignedSaveData { .. })
        );
        prop_assert!(rejected);
    }

    #[test]
    fn prop_normalize_tiles_single_pak(len in 1usize..=CONTROLLER_PAK_SIZE) {
        let payload: Vec<u8> = (0..len).map(|i| (i % 255) as u8 + 1).collect();
        let rule = SaveKind::ControllerPak.normalization().unwrap();
        let out = normalize(&payload, &rule);

        prop_assert_eq!(out.len(), CONTROLLER_PAK_CONTAINER_SIZE);
        for slot in out.chunks_exact(CONTROLLER_PAK_SIZE) {
            prop_assert_eq!(&slot[..len], &payload[..]);
            prop_assert!(slot[len..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn prop_normalize_keeps_multi_pak_image(
        len in (CONTROLLER_PAK_SIZE + 1)..(2 * CONTROLLER_PAK_CONTAINER_SIZE)
    ) {
        let payload: Vec<u8> = (0..len).map(|i| (i % 255) as u8 + 1).collect();
        let rule = SaveKind::ControllerPak.normalization().unwrap();
        let out = normalize(&payload, &rule);

        prop_assert_eq!(out.len(), CONTROLLER_PAK_CONTAINER_SIZE);
        let kept = len.min(CONTROLLER_PAK_CONTAINER_SIZE);
        prop_assert_eq!(&out[..kept], &payload[..kept]);
        prop_assert!(out[kept..].iter().all(|&b| b == 0));
    }
}

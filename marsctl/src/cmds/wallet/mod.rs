pub mod address;
pub mod generate;
pub mod import_key;
pub mod import_mnemonic;
pub mod info;
pub mod load_mnemonic;
pub mod save_mnemonic;
pub mod set_address;
pub mod write_keystore;

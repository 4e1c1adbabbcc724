// 統合テスト用のヘルパー
// 画像ファイルの生成とレジストリ構築

#![allow(dead_code)]

pub mod images;

pub use images::*;

// 合成範囲の解決
//
// 利用者が入力した1始まりの(開始, 終了)を、`images[start-1 : end]`と同じ
// 半開区間のスライスに解決する。終了が画像数を超える場合は末尾で切り詰める。

use crate::core::{Direction, ImageFormatToken, MergeRange, RangeError};

fn parse_bound(index: usize, raw: &str) -> Result<i64, RangeError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| RangeError::NonNumeric {
            index,
            value: raw.to_string(),
        })
}

/// 生の文字列ペアを解決済みの範囲に変換
///
/// `index`は報告用の1始まり番号、`available`は入力画像の総数。
pub fn resolve_range(
    index: usize,
    start: &str,
    end: &str,
    available: usize,
    direction: Direction,
    output_format: ImageFormatToken,
) -> Result<MergeRange, RangeError> {
    let start_value = parse_bound(index, start)?;
    let end_value = parse_bound(index, end)?;

    if start_value < 1 {
        return Err(RangeError::StartBelowOne {
            index,
            start: start_value,
        });
    }

    let available_i64 = i64::try_from(available).unwrap_or(i64::MAX);
    let lower = start_value - 1;
    let upper = end_value.clamp(0, available_i64);
    if lower >= upper {
        return Err(RangeError::Empty {
            index,
            start: start_value,
            end: end_value,
            available,
        });
    }

    // lower < upper <= available なので両方usizeに収まる
    Ok(MergeRange {
        index,
        start_ordinal: (lower + 1) as usize,
        end_ordinal: upper as usize,
        direction,
        output_format,
    })
}

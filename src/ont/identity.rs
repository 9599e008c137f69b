use tracing::debug;

use crate::error::Result;
use crate::snmp::{Oid, SnmpClient, SnmpSession, decode_text, extract_index};

/// Ищет индекс ONT по значению в поддереве `base` (описание или имя).
///
/// Линейный проход walk'ом, сравнение точное после trim значения с устройства.
/// При нескольких совпадениях побеждает первое в порядке OID.
/// `Ok(None)` - ничего не нашлось, ошибки транспорта пробрасываются как есть.
// TODO: кэш index <-> описание/имя с коротким TTL, сейчас каждый поиск обходит всё поддерево
pub async fn find_index_by_value<S: SnmpSession>(
    client: &mut SnmpClient<S>,
    base: &Oid,
    match_value: &str,
) -> Result<Option<String>> {
    let base_str = base.to_string();
    let mut walk = client.walk(base);
    let mut scanned = 0usize;

    while let Some(binding) = walk.next().await {
        let binding = binding?;
        scanned += 1;

        let Some(text) = decode_text(&binding.value) else {
            debug!(oid = %binding.oid, kind = binding.value.type_name(), "skipping non-string value");
            continue;
        };

        if text == match_value {
            let index = extract_index(&binding.oid.to_string(), &base_str)?;
            debug!(base = %base_str, index = %index, scanned, "identity resolved");
            return Ok(Some(index));
        }
    }

    debug!(base = %base_str, scanned, "identity not found");
    Ok(None)
}

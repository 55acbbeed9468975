//! Report fixtures and zip helpers

use std::io::{Cursor, Write};
use zip::write::FileOptions;

/// BSE report for 02 Jan 2023: one row with ISIN, one resolved via the
/// reference table, one unknown security
pub const BSE_REPORT: &str = "\
SC_CODE,SC_NAME,SC_GROUP,SC_TYPE,OPEN,HIGH,LOW,CLOSE,LAST,PREVCLOSE,NO_TRADES,NO_OF_SHRS,NET_TURNOV,TDCLOINDI,ISIN_CODE
500325,RELIANCE    ,A ,Q,2550.00,2580.00,2540.10,2575.35,2576.00,2547.20,51234,812345,2091234567.00,,
532540,TCS         ,A ,Q,3250.00,3290.00,3240.00,3280.40,3281.00,3245.90,21234,112345,368234567.00,,INE467B01029
999001,UNLISTED CO ,X ,Q,10.00,11.00,9.50,10.50,10.40,10.00,12,1000,10500.00,,
";

pub fn nse_report(stamp: &str) -> String {
    format!(
        "\
SYMBOL,SERIES,OPEN,HIGH,LOW,CLOSE,LAST,PREVCLOSE,TOTTRDQTY,TOTTRDVAL,TIMESTAMP,TOTALTRADES,ISIN,
INFY,EQ,1510,1525.5,1500.05,1520.3,1521,1508.9,5123456,7781234567.8,{stamp},151234,INE009A01021,
RELIANCE,EQ,2550,2580,2540.1,2575.35,2576,2547.2,4512345,11512345678.9,{stamp},181234,INE002A01018,
",
        stamp = stamp
    )
}

/// Build an in-memory zip with the given entries
pub fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .expect("start zip entry");
        writer.write_all(contents).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

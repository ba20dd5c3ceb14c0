const BASE_URL: &str = "http://homeoint.org/books/kentrep/";
const BASE_URL_ALT: &str = "http://homeoint.org/books/kentrep3/";

// Page files step by 5 and each carries an anchor to file number + 1:
// kent0000.htm#P1, kent0005.htm#P6, kent0010.htm#P11, ...
const FILE_STEP: u32 = 5;
const LAST_PAGE: u32 = 1423;
// Files above this number live under the kentrep3/ directory
const LAST_MAIN_FILE: u32 = 1415;

/// Generate the full list of (url, page number) pairs for the source corpus.
/// The layout is arithmetic; there is no sitemap to fetch.
pub fn page_urls() -> Vec<(String, u32)> {
    let mut urls = Vec::new();
    let mut file_number = 0;
    loop {
        let page_number = file_number + 1;
        if page_number > LAST_PAGE {
            break;
        }
        let base = if file_number <= LAST_MAIN_FILE { BASE_URL } else { BASE_URL_ALT };
        urls.push((format!("{}kent{:04}.htm#P{}", base, file_number, page_number), page_number));
        file_number += FILE_STEP;
    }
    urls
}

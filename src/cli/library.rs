use tabled::Table;

use crate::{
    Error, Result, info,
    spotify::{MusicProvider, PAGE_LIMIT},
    types::{AlbumTableRow, ArtistTableRow, PlaylistTableRow, TrackTableRow},
    utils,
};

use super::connect;

/// Offset of the 1-based `page`.
fn page_offset(page: u32) -> u32 {
    page.saturating_sub(1) * PAGE_LIMIT
}

fn print_page<T: tabled::Tabled>(rows: Vec<T>, page: u32, total: u32) {
    if rows.is_empty() {
        info!("Nothing on page {}", page);
        return;
    }
    println!("{}", Table::new(rows));
    info!("Page {} of {}", page, total.div_ceil(PAGE_LIMIT).max(1));
}

pub async fn tracks(page: u32) -> Result<()> {
    let session = connect().await?;
    let saved = session
        .provider
        .saved_tracks(PAGE_LIMIT, page_offset(page))
        .await?;
    let rows = saved
        .items
        .iter()
        .map(|s| TrackTableRow::from(&s.track))
        .collect();
    print_page::<TrackTableRow>(rows, page, saved.total);
    Ok(())
}

pub async fn albums(page: u32) -> Result<()> {
    let session = connect().await?;
    let saved = session
        .provider
        .saved_albums(PAGE_LIMIT, page_offset(page))
        .await?;
    let rows = saved
        .items
        .iter()
        .map(|s| AlbumTableRow::from(&s.album))
        .collect();
    print_page::<AlbumTableRow>(rows, page, saved.total);
    Ok(())
}

pub async fn playlists(page: u32) -> Result<()> {
    let session = connect().await?;
    let playlists = session
        .provider
        .user_playlists(PAGE_LIMIT, page_offset(page))
        .await?;
    let rows = playlists.items.iter().map(PlaylistTableRow::from).collect();
    print_page::<PlaylistTableRow>(rows, page, playlists.total);
    Ok(())
}

/// Followed artists. The endpoint pages by cursor, so earlier pages are
/// walked to reach `page`.
pub async fn artists(page: u32) -> Result<()> {
    let session = connect().await?;
    let provider = &session.provider;

    let pb = utils::spinner("Fetching followed artists...");
    let result = async {
        let mut artists = provider.followed_artists(PAGE_LIMIT, None).await?;
        let mut reached = 1;
        while reached < page {
            let Some(after) = artists.cursors.as_ref().and_then(|c| c.after.clone()) else {
                break;
            };
            artists = provider.followed_artists(PAGE_LIMIT, Some(&after)).await?;
            reached += 1;
        }
        Ok::<_, Error>((artists, reached))
    }
    .await;
    pb.finish_and_clear();

    let (artists, reached) = result?;
    let rows = if reached < page {
        Vec::new()
    } else {
        artists.items.iter().map(ArtistTableRow::from).collect()
    };
    print_page::<ArtistTableRow>(rows, page, artists.total.unwrap_or_default());
    Ok(())
}

pub async fn album_tracks(album_id: &str, page: u32) -> Result<()> {
    let session = connect().await?;
    let tracks = session
        .provider
        .album_tracks(album_id, PAGE_LIMIT, page_offset(page))
        .await?;
    let rows = tracks.items.iter().map(TrackTableRow::from).collect();
    print_page::<TrackTableRow>(rows, page, tracks.total);
    Ok(())
}

pub async fn playlist_tracks(playlist_id: &str, page: u32) -> Result<()> {
    let session = connect().await?;
    let items = session
        .provider
        .playlist_items(playlist_id, PAGE_LIMIT, page_offset(page))
        .await?;
    let rows = items
        .items
        .iter()
        .filter_map(|item| item.track.as_ref())
        .map(TrackTableRow::from)
        .collect();
    print_page::<TrackTableRow>(rows, page, items.total);
    Ok(())
}

/// Prints matching tracks, artists, albums and playlists.
pub async fn search(query: &str, page: u32) -> Result<()> {
    let session = connect().await?;
    let results = session
        .provider
        .search(query, PAGE_LIMIT, page_offset(page))
        .await?;

    if let Some(tracks) = &results.tracks {
        info!("Tracks");
        let rows = tracks.items.iter().map(TrackTableRow::from).collect();
        print_page::<TrackTableRow>(rows, page, tracks.total);
    }
    if let Some(artists) = &results.artists {
        info!("Artists");
        let rows = artists.items.iter().map(ArtistTableRow::from).collect();
        print_page::<ArtistTableRow>(rows, page, artists.total);
    }
    if let Some(albums) = &results.albums {
        info!("Albums");
        let rows = albums.items.iter().map(AlbumTableRow::from).collect();
        print_page::<AlbumTableRow>(rows, page, albums.total);
    }
    if let Some(playlists) = &results.playlists {
        info!("Playlists");
        let rows = playlists
            .items
            .iter()
            .flatten()
            .map(PlaylistTableRow::from)
            .collect();
        print_page::<PlaylistTableRow>(rows, page, playlists.total);
    }
    Ok(())
}
